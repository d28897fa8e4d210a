//! Error types for configuration and container shape checks
//!
//! Physics routines never fail: out-of-range intermediates are logged and
//! physical bounds are clamped in place. Only configuration problems and
//! caller-supplied inputs with the wrong shape surface as errors.

/// Errors raised while building or driving a cell's sub-tile state
#[derive(Debug, Clone, PartialEq)]
pub enum SubtileError {
    /// A configuration value is out of its allowed range
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },
    /// Configuration text could not be parsed
    ConfigParse(String),
    /// Caller-supplied inputs do not match the allocated containers
    ShapeMismatch {
        /// Which input was checked
        what: &'static str,
        /// Length the containers were allocated for
        expected: usize,
        /// Length that was supplied
        found: usize,
    },
}

impl SubtileError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        SubtileError::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(SubtileError::ShapeMismatch {
                what,
                expected,
                found,
            })
        }
    }
}

impl std::fmt::Display for SubtileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtileError::InvalidConfig { field, message } => {
                write!(f, "Invalid configuration for {field}: {message}")
            }
            SubtileError::ConfigParse(msg) => write!(f, "Failed to parse configuration: {msg}"),
            SubtileError::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(f, "Shape mismatch for {what}: expected {expected}, found {found}"),
        }
    }
}

impl std::error::Error for SubtileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_len() {
        assert!(SubtileError::check_len("veg_hist", 3, 3).is_ok());

        let err = SubtileError::check_len("veg_hist", 3, 2).unwrap_err();
        assert_eq!(
            err,
            SubtileError::ShapeMismatch {
                what: "veg_hist",
                expected: 3,
                found: 2
            }
        );
        assert_eq!(
            err.to_string(),
            "Shape mismatch for veg_hist: expected 3, found 2"
        );
    }

    #[test]
    fn test_invalid_config_display() {
        let err = SubtileError::invalid("nlayer", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for nlayer: must be at least 1"
        );
    }
}
