use thiserror::Error;

/// Main error type for the module optimizer
#[derive(Error, Debug)]
pub enum OptError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend error: {backend}, message: {message}")]
    Backend { backend: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OptError {
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for optimizer operations
pub type OptResult<T> = Result<T, OptError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::OptError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::OptError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = OptError::backend("opencl", "no device");
        assert!(error.to_string().contains("opencl"));
        assert!(error.to_string().contains("no device"));
    }

    #[test]
    fn test_error_conversion() {
        let parse_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: OptError = parse_err.into();

        match err {
            OptError::Serialization(_) => (),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_macros() {
        let config_err = config_error!("max_solutions must be positive, got {}", 0);
        assert!(matches!(config_err, OptError::Config(_)));
        let validation_err = validation_error!("unknown category: {}", "ranged");
        assert!(validation_err.to_string().contains("ranged"));
    }
}
