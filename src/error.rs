//! Error handling for the flowline runtime.
//!
//! Every error in this module is a construction-order or wiring bug in the
//! embedding application, not a recoverable runtime condition. The runtime
//! fails fast and loudly at first use: a misconfigured workflow would
//! otherwise show up as a pipeline that silently stops making progress.

use thiserror::Error;

/// Errors raised by workflow wiring and dispatch.
#[derive(Error, Debug)]
pub enum FlowError {
    /// A mandatory port could not resolve its mapping name against the
    /// workflow's channel table. Raised during the wiring dispatch, before
    /// any user step runs.
    #[error("step '{step}' requires a channel named '{channel}' which is not declared")]
    MissingChannel { step: String, channel: String },

    /// A port resolved to a channel holding a different value type.
    #[error(
        "port '{channel}' on step '{step}' expects a channel of {expected}, found {actual}"
    )]
    ChannelTypeMismatch {
        step: String,
        channel: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A step's executor slot had no executor bound at dispatch time.
    #[error("step '{step}' has no executor bound to its slot")]
    UnboundExecutor { step: String },

    /// The workflow has no user steps to execute.
    #[error("workflow '{0}' has no steps")]
    EmptyWorkflow(String),

    /// A config file referenced an unknown executor kind or invalid field.
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for flowline operations.
pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_channel_display() {
        let err = FlowError::MissingChannel {
            step: "ColorFilter".into(),
            channel: "BinaryPicture".into(),
        };
        assert_eq!(
            err.to_string(),
            "step 'ColorFilter' requires a channel named 'BinaryPicture' which is not declared"
        );
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = FlowError::ChannelTypeMismatch {
            step: "Counter".into(),
            channel: "count".into(),
            expected: "i64",
            actual: "alloc::string::String",
        };
        assert!(err.to_string().contains("expects a channel of i64"));
        assert!(err.to_string().contains("String"));
    }
}
