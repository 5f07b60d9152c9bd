pub mod builder;
pub mod config;
pub mod error;
pub mod layout;
pub mod summary;

pub use builder::{build, Builder, BuiltSquare, PlacedBlob};
pub use config::SquareConfig;
pub use error::{CapacityError, Error, LayoutError, Result};
pub use layout::{fits_in_square, msg_shares_used_ni_defaults, next_aligned_power_of_two};
pub use summary::{namespace_summary, square_summary, NamespaceSummary};
