use da_square_primitives::{Share, SHARE_SIZE};
use eyre::{eyre, Result};
use reed_solomon_novelpoly::{CodeParams, WrappedShard};

/// Bytes per GF(2^16) symbol.
const SYMBOL_SIZE: usize = 2;

/// A systematic reed-solomon code extending `k` shares to `2k`.
///
/// The codec encodes a payload in chunks of `k` symbols and hands symbol `j`
/// of every chunk to codeword `j`. Interleaving the shares symbol by symbol
/// therefore makes codeword `j` equal to share `j` for the data half, and the
/// remaining `k` codewords are the parity shares.
pub struct ReedSolomon {
    k: usize,
    // A single data share extends by repetition, which the codec rejects.
    rs: Option<reed_solomon_novelpoly::ReedSolomon>,
}

impl ReedSolomon {
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 || !k.is_power_of_two() {
            return Err(eyre!("data shard count {k} is not a power of two"));
        }
        let rs = if k == 1 {
            None
        } else {
            Some(CodeParams::derive_parameters(2 * k, k)?.make_encoder())
        };
        Ok(Self { k, rs })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the `k` parity shares for `data`.
    pub fn encode_shares(&self, data: &[Share]) -> Result<Vec<Share>> {
        if data.len() != self.k {
            return Err(eyre!("expected {} data shares, got {}", self.k, data.len()));
        }
        let Some(rs) = &self.rs else {
            return Ok(data.to_vec());
        };

        let payload = interleave(data);
        let encoded = rs.encode::<WrappedShard>(&payload)?;
        log::trace!("encoded {} shares into {} codewords", data.len(), encoded.len());

        encoded
            .into_iter()
            .skip(self.k)
            .take(self.k)
            .map(|shard| Ok(Share::from_bytes(&shard.into_inner())?))
            .collect()
    }

    /// Recovers the `k` data shares from any `k` of the `2k`.
    pub fn reconstruct_shares(&self, shards: Vec<Option<Share>>) -> Result<Vec<Share>> {
        if shards.len() != 2 * self.k {
            return Err(eyre!(
                "expected {} shards, got {}",
                2 * self.k,
                shards.len()
            ));
        }
        let present = shards.iter().filter(|s| s.is_some()).count();
        if present < self.k {
            return Err(eyre!("need {} shards to recover, have {present}", self.k));
        }
        let Some(rs) = &self.rs else {
            return shards
                .into_iter()
                .flatten()
                .next()
                .map(|share| vec![share])
                .ok_or_else(|| eyre!("no shard to recover from"));
        };

        let received = shards
            .into_iter()
            .map(|s| s.map(|share| WrappedShard::new(share.as_bytes().to_vec())))
            .collect::<Vec<_>>();
        let payload = rs.reconstruct(received)?;
        deinterleave(&payload, self.k)
    }

    /// Recovers the missing shards and returns the full `2k` codeword.
    pub fn repair(&self, shards: Vec<Option<Share>>) -> Result<Vec<Share>> {
        let mut data = self.reconstruct_shares(shards)?;
        let parity = self.encode_shares(&data)?;
        data.extend(parity);
        Ok(data)
    }
}

/// Lays out symbol `c` of every share next to each other, chunk by chunk.
fn interleave(shares: &[Share]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(shares.len() * SHARE_SIZE);
    for c in (0..SHARE_SIZE).step_by(SYMBOL_SIZE) {
        for share in shares {
            payload.extend_from_slice(&share.as_bytes()[c..c + SYMBOL_SIZE]);
        }
    }
    payload
}

fn deinterleave(payload: &[u8], k: usize) -> Result<Vec<Share>> {
    if payload.len() < k * SHARE_SIZE {
        return Err(eyre!(
            "reconstructed {} bytes, expected {}",
            payload.len(),
            k * SHARE_SIZE
        ));
    }
    let mut shares = vec![[0u8; SHARE_SIZE]; k];
    for (chunk_index, chunk) in payload[..k * SHARE_SIZE]
        .chunks_exact(k * SYMBOL_SIZE)
        .enumerate()
    {
        let offset = chunk_index * SYMBOL_SIZE;
        for (j, symbol) in chunk.chunks_exact(SYMBOL_SIZE).enumerate() {
            shares[j][offset..offset + SYMBOL_SIZE].copy_from_slice(symbol);
        }
    }
    Ok(shares.into_iter().map(Share).collect())
}
