//! Error type shared by every generation stage.

use thiserror::Error;

/// Errors raised while configuring or running city generation.
///
/// Only configuration problems are errors. Routine outcomes such as a park
/// that found no free square are handled locally by the stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CityGenError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("noise scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
}

impl CityGenError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        CityGenError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CityGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        let err = CityGenError::OutOfBounds { x: -1, y: 3, width: 16, height: 16 };
        assert_eq!(err.to_string(), "cell (-1, 3) is outside the 16x16 grid");

        let err = CityGenError::invalid("meander", "must be within [0, 1]");
        assert!(err.to_string().contains("meander"));
    }
}
