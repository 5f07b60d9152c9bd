use std::path::Path;

use da_square_primitives::{DEFAULT_MAX_SQUARE_SIZE, MIN_SQUARE_SIZE};
use serde::{Deserialize, Serialize};

use crate::{
    error::{LayoutError, Result},
    layout::check_square_size,
};

/// Bounds on the width of the squares the builder produces.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SquareConfig {
    pub min_square_size: usize,
    pub max_square_size: usize,
}

impl Default for SquareConfig {
    fn default() -> Self {
        Self {
            min_square_size: MIN_SQUARE_SIZE,
            max_square_size: DEFAULT_MAX_SQUARE_SIZE,
        }
    }
}

impl SquareConfig {
    pub fn new(min_square_size: usize, max_square_size: usize) -> Result<Self, LayoutError> {
        let config = Self {
            min_square_size,
            max_square_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        check_square_size(self.min_square_size)?;
        check_square_size(self.max_square_size)?;
        if self.min_square_size > self.max_square_size {
            return Err(LayoutError::InvalidBounds {
                min: self.min_square_size,
                max: self.max_square_size,
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn max_capacity(&self) -> usize {
        self.max_square_size * self.max_square_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use da_square_primitives::MAX_SQUARE_SIZE;

    #[test]
    fn test_defaults() {
        let config = SquareConfig::from_json("{}").unwrap();
        assert_eq!(config, SquareConfig::default());
        assert_eq!(config.min_square_size, 1);
        assert_eq!(config.max_square_size, 128);

        let config = SquareConfig::from_json(r#"{"max_square_size":64}"#).unwrap();
        assert_eq!(config, SquareConfig::new(1, 64).unwrap());
        assert_eq!(config.max_capacity(), 4096);
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            SquareConfig::new(3, 8),
            Err(LayoutError::InvalidSquareSize(3))
        );
        assert_eq!(
            SquareConfig::new(16, 8),
            Err(LayoutError::InvalidBounds { min: 16, max: 8 })
        );
        assert!(matches!(
            SquareConfig::from_json(r#"{"min_square_size":0}"#),
            Err(Error::Layout(LayoutError::InvalidSquareSize(0)))
        ));
        assert!(matches!(
            SquareConfig::from_json("not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_squares() {
        assert_eq!(
            SquareConfig::new(1, 1 << 32),
            Err(LayoutError::SquareTooLarge {
                size: 1 << 32,
                max: MAX_SQUARE_SIZE
            })
        );
        assert!(matches!(
            SquareConfig::from_json(r#"{"max_square_size":65536}"#),
            Err(Error::Layout(LayoutError::SquareTooLarge { size: 65536, .. }))
        ));

        let config = SquareConfig::new(MAX_SQUARE_SIZE, MAX_SQUARE_SIZE).unwrap();
        assert_eq!(config.max_capacity(), 1 << 30);
    }
}
