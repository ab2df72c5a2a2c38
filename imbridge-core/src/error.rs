//! Bridge error type and the reply codes it maps to.

/// Errors produced by the bridge itself or passed through from the native SDK.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("missing required argument `{0}`")]
    MissingArgument(String),

    #[error("invalid argument `{key}`: {reason}")]
    InvalidArgument { key: String, reason: String },

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// Failure reported by the native SDK, forwarded unchanged.
    #[error("native error {code}: {message}")]
    Native { code: i32, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Code reported to the host in an error reply.
    ///
    /// Native errors keep the SDK's numeric code as decimal text.
    pub fn code(&self) -> String {
        match self {
            Self::MissingArgument(_) => "MISSING_ARGUMENT".to_string(),
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT".to_string(),
            Self::UnknownMethod(_) => "UNKNOWN_METHOD".to_string(),
            Self::Native { code, .. } => code.to_string(),
            Self::Config(_) => "CONFIG".to_string(),
            Self::Io(_) => "IO".to_string(),
        }
    }

    /// Message reported to the host. Native messages pass through verbatim.
    pub fn message(&self) -> String {
        match self {
            Self::Native { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_passes_through() {
        let err = BridgeError::Native {
            code: 10002,
            message: "token expired".to_string(),
        };
        assert_eq!(err.code(), "10002");
        assert_eq!(err.message(), "token expired");
    }

    #[test]
    fn test_validation_codes() {
        assert_eq!(
            BridgeError::MissingArgument("uid".into()).code(),
            "MISSING_ARGUMENT"
        );
        let err = BridgeError::invalid("token", "expected a string");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(
            err.message(),
            "invalid argument `token`: expected a string"
        );
    }
}
