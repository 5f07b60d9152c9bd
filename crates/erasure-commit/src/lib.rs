pub use eyre::Result;

pub mod commitment;
pub mod eds;
pub mod erasure;
pub mod error;
pub mod grid;
pub mod merkle;
pub mod nmt;
pub mod wrapper;

pub use commitment::{
    commitment_from_shares, commitment_from_square, create_blob_commitment, create_commitment,
    merkle_mountain_range_sizes, verify_commitment,
};
pub use eds::{DataAvailabilityHeader, ExtendedDataSquare};
pub use erasure::ReedSolomon;
pub use error::{CommitmentError, ProofError, TreePushError};
pub use merkle::Hash;
pub use nmt::{NamespaceMerkleTree, NamespacedHash, Proof};
pub use wrapper::ErasuredNamespacedMerkleTree;

use da_square_primitives::Square;

/// An erasure commitment, existing of the row and column roots and the
/// erasure encoded square they commit to.
pub struct ErasureCommitment {
    /// The commitment to the encoded data
    pub commitment: DataAvailabilityHeader,
    /// The encoded data
    pub encoding: ExtendedDataSquare,
}

impl ErasureCommitment {
    /// Extend and commit the square
    pub fn commit(square: &Square) -> Result<Self> {
        let encoding = ExtendedDataSquare::compute(square)?;
        let commitment = DataAvailabilityHeader::new(&encoding)?;
        log::debug!(
            "committed square of width {} with data root {}",
            square.size(),
            hex::encode(commitment.hash())
        );
        Ok(Self {
            commitment,
            encoding,
        })
    }

    pub fn data_root(&self) -> Hash {
        self.commitment.hash()
    }

    /// Recompute the roots over the encoding and compare them to the header
    pub fn verify(&self) -> Result<bool> {
        Ok(DataAvailabilityHeader::new(&self.encoding)? == self.commitment)
    }
}
