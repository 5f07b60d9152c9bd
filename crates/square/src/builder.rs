//! Lays admitted transactions and their blobs out into a square.
//!
//! Transactions go first, as one compact sequence in the transaction
//! namespace. Blobs follow sorted by namespace, each starting where the
//! non-interactive default rules put it, and the rest is tail padding.

use da_square_blob::{process_blob_tx, BlobTx, Registry};
use da_square_erasure_commit::ErasureCommitment;
use da_square_primitives::{
    shares::{delimit_units, delimited_len, shares_needed, split_sequence},
    Blob, Namespace, Share, Square, SHARE_VERSION_ZERO, TX_NAMESPACE,
};

use crate::{
    config::SquareConfig,
    error::{CapacityError, Error, LayoutError, Result},
    layout::{fits_in_square, msg_shares_used_ni_defaults},
};

/// A blob and the share index it starts at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedBlob {
    pub start: usize,
    pub blob: Blob,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltSquare {
    pub square: Square,
    /// Raw transactions that made it into the square, in priority order.
    pub txs: Vec<Vec<u8>>,
    /// In square order, which is namespace order.
    pub blobs: Vec<PlacedBlob>,
}

impl BuiltSquare {
    pub fn size(&self) -> usize {
        self.square.size()
    }

    /// Extends the square and computes its row and column roots.
    pub fn commit(&self) -> eyre::Result<ErasureCommitment> {
        ErasureCommitment::commit(&self.square)
    }
}

pub struct Builder<'a> {
    config: SquareConfig,
    registry: &'a Registry,
    included: Vec<Vec<u8>>,
    /// Units of the transaction stream: normal txs as given, the inner tx
    /// for blob txs.
    tx_units: Vec<Vec<u8>>,
    tx_stream_len: usize,
    /// Admission order.
    blobs: Vec<Blob>,
}

impl<'a> Builder<'a> {
    pub fn new(config: SquareConfig, registry: &'a Registry) -> Result<Self, LayoutError> {
        config.validate()?;
        Ok(Self {
            config,
            registry,
            included: vec![],
            tx_units: vec![],
            tx_stream_len: 0,
            blobs: vec![],
        })
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    /// Admits `raw` if it is valid and still fits in the largest square. On
    /// error the builder is unchanged.
    pub fn append(&mut self, raw: Vec<u8>) -> Result<()> {
        match BlobTx::unmarshal(&raw)? {
            Some(blob_tx) => {
                let processed = process_blob_tx(self.registry, &blob_tx)?;
                let capacity = self.config.max_capacity();
                for blob in &processed.blobs {
                    let shares = blob.share_count();
                    if shares > capacity {
                        return Err(CapacityError::BlobTooLarge { shares, capacity }.into());
                    }
                }
                self.admit(raw, processed.raw_tx, processed.blobs)
            }
            None => {
                let unit = raw.clone();
                self.admit(raw, unit, vec![])
            }
        }
    }

    fn admit(&mut self, raw: Vec<u8>, unit: Vec<u8>, blobs: Vec<Blob>) -> Result<()> {
        let stream_len = self.tx_stream_len + delimited_len(unit.len());

        let mut candidates: Vec<(Namespace, usize)> = self
            .blobs
            .iter()
            .chain(&blobs)
            .map(|b| (b.namespace, b.share_count()))
            .collect();
        candidates.sort_by_key(|(namespace, _)| *namespace);
        let lens: Vec<usize> = candidates.into_iter().map(|(_, len)| len).collect();

        let (fits, _) = fits_in_square(shares_needed(stream_len), self.config.max_square_size, &lens)?;
        if !fits {
            return Err(CapacityError::SquareFull {
                capacity: self.config.max_capacity(),
            }
            .into());
        }

        log::trace!("admitted tx of {} bytes with {} blobs", raw.len(), blobs.len());
        self.included.push(raw);
        self.tx_units.push(unit);
        self.tx_stream_len = stream_len;
        self.blobs.extend(blobs);
        Ok(())
    }

    pub fn export(self) -> Result<BuiltSquare> {
        if self.is_empty() {
            return Ok(BuiltSquare {
                square: Square::empty(),
                txs: vec![],
                blobs: vec![],
            });
        }

        let mut blobs = self.blobs;
        blobs.sort_by_key(|b| b.namespace);
        let lens: Vec<usize> = blobs.iter().map(Blob::share_count).collect();

        let tx_shares = split_sequence(TX_NAMESPACE, SHARE_VERSION_ZERO, &delimit_units(&self.tx_units))?;
        let size = smallest_fitting_size(&self.config, tx_shares.len(), &lens)?;
        let (_, starts) = msg_shares_used_ni_defaults(tx_shares.len(), size, &lens)?;

        let mut shares = tx_shares;
        let mut padding = TX_NAMESPACE;
        let mut placed = Vec::with_capacity(blobs.len());
        for (blob, start) in blobs.into_iter().zip(starts) {
            let start = start as usize;
            shares.resize(start, Share::namespace_padding(padding));
            shares.extend(blob.to_shares()?);
            padding = blob.namespace;
            placed.push(PlacedBlob { start, blob });
        }
        shares.resize(size * size, Share::tail_padding());

        if let Some(index) = shares
            .windows(2)
            .position(|pair| pair[0].namespace() > pair[1].namespace())
        {
            return Err(Error::Unordered { index: index + 1 });
        }

        log::debug!(
            "built square of width {size} with {} txs and {} blobs",
            self.included.len(),
            placed.len()
        );
        Ok(BuiltSquare {
            square: Square::new(size, shares)?,
            txs: self.included,
            blobs: placed,
        })
    }
}

fn smallest_fitting_size(config: &SquareConfig, tx_shares: usize, lens: &[usize]) -> Result<usize> {
    let mut size = config.min_square_size;
    loop {
        if fits_in_square(tx_shares, size, lens)?.0 {
            return Ok(size);
        }
        if size >= config.max_square_size {
            return Err(CapacityError::SquareFull {
                capacity: config.max_capacity(),
            }
            .into());
        }
        size *= 2;
    }
}

/// Builds the square for `txs`, given in priority order. Transactions that
/// are invalid or do not fit are left out.
pub fn build(txs: Vec<Vec<u8>>, config: &SquareConfig, registry: &Registry) -> Result<BuiltSquare> {
    let mut builder = Builder::new(*config, registry)?;
    for (index, raw) in txs.into_iter().enumerate() {
        match builder.append(raw) {
            Ok(()) => {}
            Err(err @ Error::Layout(_)) => return Err(err),
            Err(err) => log::debug!("dropping tx {index}: {err}"),
        }
    }
    builder.export()
}
