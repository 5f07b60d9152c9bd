//! The share codec.
//!
//! Every share starts with the namespace it belongs to and an info byte. The
//! first share of a sequence additionally carries the varint encoded length of
//! the whole sequence, so a reader can tell where a blob ends without any
//! outside information:
//!
//! ```text
//! | namespace (8) | info (1) | varint(len) | payload ... | zero padding |
//! ```
//!
//! Transactions are written as one "compact" sequence in the transaction
//! namespace, each unit prefixed by its own varint length.

use core::fmt;

use prost::encoding::{decode_varint, encode_varint, encoded_len_varint};
use thiserror::Error;

use crate::{
    Namespace, ShareVersion, MAX_SHARE_VERSION, NAMESPACE_SIZE, SHARE_INFO_BYTES, SHARE_SIZE,
    TAIL_PADDING_NAMESPACE,
};

/// The namespace and info byte present on every share.
pub const SHARE_PREFIX_SIZE: usize = NAMESPACE_SIZE + SHARE_INFO_BYTES;
/// Payload bytes available on any share that does not start a sequence.
pub const CONTINUATION_SHARE_CAPACITY: usize = SHARE_SIZE - SHARE_PREFIX_SIZE;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share version {0} exceeds the maximum {MAX}", MAX = MAX_SHARE_VERSION)]
    UnsupportedVersion(ShareVersion),
    #[error("invalid share length: got {0} want {want}", want = SHARE_SIZE)]
    InvalidLength(usize),
    #[error("no shares to parse")]
    Empty,
    #[error("share {0} was expected to start a sequence")]
    MissingSequenceStart(usize),
    #[error("share {0} starts a new sequence before the current one ended")]
    UnexpectedSequenceStart(usize),
    #[error("share {index} continues a sequence of {expected} but has namespace {got}")]
    NamespaceChanged {
        index: usize,
        expected: Namespace,
        got: Namespace,
    },
    #[error("share {index} has version {got}, sequence started with {expected}")]
    VersionChanged {
        index: usize,
        expected: ShareVersion,
        got: ShareVersion,
    },
    #[error("sequence of {len} bytes needs {expected} shares, only {got} remain")]
    Truncated {
        len: usize,
        expected: usize,
        got: usize,
    },
    #[error("unit of {len} bytes overruns the {remaining} remaining bytes")]
    UnitOverrun { len: usize, remaining: usize },
    #[error("malformed varint: {0}")]
    Varint(#[from] prost::DecodeError),
}

/// The second byte of each share: `version << 1 | sequence_start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoByte(u8);

impl InfoByte {
    pub fn new(version: ShareVersion, is_sequence_start: bool) -> Result<Self, ShareError> {
        if version > MAX_SHARE_VERSION {
            return Err(ShareError::UnsupportedVersion(version));
        }
        Ok(Self(version << 1 | is_sequence_start as u8))
    }

    pub fn version(&self) -> ShareVersion {
        self.0 >> 1
    }

    pub fn is_sequence_start(&self) -> bool {
        self.0 & 1 == 1
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// A fixed size unit of square data.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Share(pub [u8; SHARE_SIZE]);

impl Share {
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ShareError> {
        raw.try_into()
            .map(Self)
            .map_err(|_| ShareError::InvalidLength(raw.len()))
    }

    /// The filler used to keep blobs aligned: a sequence start of length zero
    /// carrying the namespace of whatever precedes it.
    pub fn namespace_padding(namespace: Namespace) -> Self {
        let mut raw = [0u8; SHARE_SIZE];
        raw[..NAMESPACE_SIZE].copy_from_slice(namespace.as_bytes());
        raw[NAMESPACE_SIZE] = 1;
        Self(raw)
    }

    pub fn tail_padding() -> Self {
        Self::namespace_padding(TAIL_PADDING_NAMESPACE)
    }

    pub fn namespace(&self) -> Namespace {
        let mut id = [0u8; NAMESPACE_SIZE];
        id.copy_from_slice(&self.0[..NAMESPACE_SIZE]);
        Namespace(id)
    }

    pub fn info(&self) -> InfoByte {
        InfoByte(self.0[NAMESPACE_SIZE])
    }

    pub fn is_sequence_start(&self) -> bool {
        self.info().is_sequence_start()
    }

    pub fn version(&self) -> ShareVersion {
        self.info().version()
    }

    /// Only the first share of a sequence knows its length.
    pub fn sequence_len(&self) -> Result<Option<usize>, ShareError> {
        if !self.is_sequence_start() {
            return Ok(None);
        }
        let mut rest = &self.0[SHARE_PREFIX_SIZE..];
        Ok(Some(decode_varint(&mut rest)? as usize))
    }

    /// The bytes after the prefix and, on a sequence start, the length.
    pub fn payload(&self) -> Result<&[u8], ShareError> {
        match self.sequence_len()? {
            Some(len) => {
                let offset = SHARE_PREFIX_SIZE + encoded_len_varint(len as u64);
                Ok(&self.0[offset..])
            }
            None => Ok(&self.0[SHARE_PREFIX_SIZE..]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("namespace", &self.namespace())
            .field("info", &self.info())
            .finish_non_exhaustive()
    }
}

/// Number of payload bytes the first share of a `len` byte sequence can hold.
fn first_share_capacity(len: usize) -> usize {
    SHARE_SIZE - SHARE_PREFIX_SIZE - encoded_len_varint(len as u64)
}

/// Number of shares a sequence of `len` bytes occupies.
pub fn shares_needed(len: usize) -> usize {
    let first = first_share_capacity(len);
    if len <= first {
        1
    } else {
        1 + (len - first).div_ceil(CONTINUATION_SHARE_CAPACITY)
    }
}

/// Splits one sequence into shares. An empty sequence still yields a single
/// share announcing a length of zero.
pub fn split_sequence(
    namespace: Namespace,
    version: ShareVersion,
    data: &[u8],
) -> Result<Vec<Share>, ShareError> {
    let start_info = InfoByte::new(version, true)?;
    let continuation_info = InfoByte::new(version, false)?;

    let mut shares = Vec::with_capacity(shares_needed(data.len()));

    let mut raw = [0u8; SHARE_SIZE];
    raw[..NAMESPACE_SIZE].copy_from_slice(namespace.as_bytes());
    raw[NAMESPACE_SIZE] = start_info.as_u8();
    let mut header = Vec::with_capacity(encoded_len_varint(data.len() as u64));
    encode_varint(data.len() as u64, &mut header);
    let offset = SHARE_PREFIX_SIZE + header.len();
    raw[SHARE_PREFIX_SIZE..offset].copy_from_slice(&header);

    let (head, tail) = data.split_at(data.len().min(SHARE_SIZE - offset));
    raw[offset..offset + head.len()].copy_from_slice(head);
    shares.push(Share(raw));

    for chunk in tail.chunks(CONTINUATION_SHARE_CAPACITY) {
        let mut raw = [0u8; SHARE_SIZE];
        raw[..NAMESPACE_SIZE].copy_from_slice(namespace.as_bytes());
        raw[NAMESPACE_SIZE] = continuation_info.as_u8();
        raw[SHARE_PREFIX_SIZE..SHARE_PREFIX_SIZE + chunk.len()].copy_from_slice(chunk);
        shares.push(Share(raw));
    }

    debug_assert_eq!(shares.len(), shares_needed(data.len()));
    Ok(shares)
}

/// One decoded run of shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub namespace: Namespace,
    pub version: ShareVersion,
    pub data: Vec<u8>,
}

/// Parses exactly one sequence from the front of `shares`, returning it with
/// the number of shares consumed.
pub fn parse_sequence(shares: &[Share]) -> Result<(Sequence, usize), ShareError> {
    let first = shares.first().ok_or(ShareError::Empty)?;
    let len = first
        .sequence_len()?
        .ok_or(ShareError::MissingSequenceStart(0))?;
    let needed = shares_needed(len);
    if shares.len() < needed {
        return Err(ShareError::Truncated {
            len,
            expected: needed,
            got: shares.len(),
        });
    }

    let namespace = first.namespace();
    let version = first.version();
    let mut data = Vec::with_capacity(len);
    for (index, share) in shares[..needed].iter().enumerate() {
        if share.namespace() != namespace {
            return Err(ShareError::NamespaceChanged {
                index,
                expected: namespace,
                got: share.namespace(),
            });
        }
        if share.version() != version {
            return Err(ShareError::VersionChanged {
                index,
                expected: version,
                got: share.version(),
            });
        }
        if index > 0 && share.is_sequence_start() {
            return Err(ShareError::UnexpectedSequenceStart(index));
        }
        let payload = share.payload()?;
        let take = payload.len().min(len - data.len());
        data.extend_from_slice(&payload[..take]);
    }

    Ok((
        Sequence {
            namespace,
            version,
            data,
        },
        needed,
    ))
}

/// Walks a run of shares sequence by sequence, skipping padding.
pub fn parse_sequences(shares: &[Share]) -> Result<Vec<Sequence>, ShareError> {
    let mut sequences = vec![];
    let mut cursor = 0;
    while cursor < shares.len() {
        if !shares[cursor].is_sequence_start() {
            return Err(ShareError::MissingSequenceStart(cursor));
        }
        let (sequence, consumed) = parse_sequence(&shares[cursor..])?;
        cursor += consumed;
        if !sequence.data.is_empty() {
            sequences.push(sequence);
        }
    }
    Ok(sequences)
}

/// Bytes a unit of `len` bytes takes up once delimited.
pub fn delimited_len(len: usize) -> usize {
    encoded_len_varint(len as u64) + len
}

/// Prefixes every unit with its varint length and concatenates them.
pub fn delimit_units<T: AsRef<[u8]>>(units: &[T]) -> Vec<u8> {
    let total = units
        .iter()
        .map(|u| delimited_len(u.as_ref().len()))
        .sum();
    let mut out = Vec::with_capacity(total);
    for unit in units {
        let unit = unit.as_ref();
        encode_varint(unit.len() as u64, &mut out);
        out.extend_from_slice(unit);
    }
    out
}

/// Inverse of [`delimit_units`].
pub fn parse_delimited_units(mut data: &[u8]) -> Result<Vec<Vec<u8>>, ShareError> {
    let mut units = vec![];
    while !data.is_empty() {
        let len = decode_varint(&mut data)? as usize;
        if len > data.len() {
            return Err(ShareError::UnitOverrun {
                len,
                remaining: data.len(),
            });
        }
        let (unit, rest) = data.split_at(len);
        units.push(unit.to_vec());
        data = rest;
    }
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SHARE_VERSION_ZERO, TX_NAMESPACE};

    const NS: Namespace = Namespace([1, 2, 3, 4, 5, 6, 7, 8]);

    #[test]
    fn test_shares_needed_boundaries() {
        // 512 - 9 - 1 byte varint
        assert_eq!(shares_needed(0), 1);
        assert_eq!(shares_needed(1), 1);
        assert_eq!(shares_needed(127), 1);
        // 128 takes two varint bytes, 501 fit in the first share
        assert_eq!(shares_needed(501), 1);
        assert_eq!(shares_needed(502), 2);
        assert_eq!(shares_needed(501 + 503), 2);
        assert_eq!(shares_needed(501 + 503 + 1), 3);
        assert_eq!(shares_needed(2000), 4);
    }

    #[test]
    fn test_split_layout() {
        let data = vec![7u8; 1200];
        let shares = split_sequence(NS, SHARE_VERSION_ZERO, &data).unwrap();
        assert_eq!(shares.len(), 3);

        let first = &shares[0];
        assert_eq!(first.namespace(), NS);
        assert!(first.is_sequence_start());
        assert_eq!(first.sequence_len().unwrap(), Some(1200));
        assert_eq!(first.payload().unwrap().len(), 501);

        for share in &shares[1..] {
            assert_eq!(share.namespace(), NS);
            assert!(!share.is_sequence_start());
            assert_eq!(share.sequence_len().unwrap(), None);
        }
        // last share is zero padded after 1200 - 501 - 503 = 196 bytes
        let last = shares[2].payload().unwrap();
        assert!(last[..196].iter().all(|b| *b == 7));
        assert!(last[196..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_split_parse_edge_lengths() {
        for len in [0, 1, 126, 127, 128, 501, 502, 1004, 1005, 4096] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let shares = split_sequence(NS, SHARE_VERSION_ZERO, &data).unwrap();
            assert_eq!(shares.len(), shares_needed(len), "len {len}");
            let (sequence, consumed) = parse_sequence(&shares).unwrap();
            assert_eq!(consumed, shares.len());
            assert_eq!(sequence.namespace, NS);
            assert_eq!(sequence.data, data);
        }
    }

    #[test]
    fn test_unsupported_version() {
        assert!(matches!(
            split_sequence(NS, 128, b"hi"),
            Err(ShareError::UnsupportedVersion(128))
        ));
    }

    #[test]
    fn test_parse_truncated() {
        let shares = split_sequence(NS, SHARE_VERSION_ZERO, &[1u8; 1500]).unwrap();
        assert!(matches!(
            parse_sequence(&shares[..2]),
            Err(ShareError::Truncated { expected: 3, got: 2, .. })
        ));
        assert!(matches!(
            parse_sequence(&shares[1..]),
            Err(ShareError::MissingSequenceStart(0))
        ));
    }

    #[test]
    fn test_parse_sequences_skips_padding() {
        let mut shares = split_sequence(TX_NAMESPACE, SHARE_VERSION_ZERO, b"tx").unwrap();
        shares.push(Share::namespace_padding(TX_NAMESPACE));
        shares.extend(split_sequence(NS, SHARE_VERSION_ZERO, &[9u8; 600]).unwrap());
        shares.push(Share::tail_padding());

        let sequences = parse_sequences(&shares).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].namespace, TX_NAMESPACE);
        assert_eq!(sequences[1].data, vec![9u8; 600]);
    }

    #[test]
    fn test_padding_share() {
        let padding = Share::tail_padding();
        assert_eq!(padding.namespace(), TAIL_PADDING_NAMESPACE);
        assert!(padding.is_sequence_start());
        assert_eq!(padding.sequence_len().unwrap(), Some(0));
    }

    #[test]
    fn test_delimited_units() {
        let units = vec![vec![1u8; 3], vec![], vec![2u8; 300]];
        let delimited = delimit_units(&units);
        assert_eq!(delimited.len(), 1 + 3 + 1 + 2 + 300);
        assert_eq!(parse_delimited_units(&delimited).unwrap(), units);

        assert!(matches!(
            parse_delimited_units(&[5, 1, 2]),
            Err(ShareError::UnitOverrun { len: 5, remaining: 2 })
        ));
    }
}
