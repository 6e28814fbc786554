//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories driving reconciliation
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (describe treats this as "absent")
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Resource already exists (create falls back to reuse)
    #[error("Resource already exists: {message}")]
    AlreadyExists { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// Error code reported by the service, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Sdk { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NoSuchBucket",
    "NoSuchBucketPolicy",
    "NoSuchEntity",
    "AWS.SimpleQueueService.NonExistentQueue",
    "QueueDoesNotExist",
    "TrailNotFoundException",
    "ResourceNotFoundException",
    "NoSuchConfigurationRecorderException",
    "NoSuchDeliveryChannelException",
    "NoSuchConfigRuleException",
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "EntityAlreadyExists",
    "BucketAlreadyOwnedByYou",
    "TrailAlreadyExistsException",
    "ResourceAlreadyExistsException",
    "QueueNameExists",
    "QueueAlreadyExists",
];

/// The logs service reports a duplicate resource policy as a parameter error
const DUPLICATE_POLICY_MESSAGE: &str = "Policy with the same name already exists";

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists { message },
        Some("InvalidParameterException") if message.contains(DUPLICATE_POLICY_MESSAGE) => {
            AwsError::AlreadyExists { message }
        }
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK error through its error metadata.
///
/// Falls back to the full display context when the service sent no message,
/// which keeps transport failures readable.
pub fn classify_sdk_error<E>(err: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let context = DisplayErrorContext(err).to_string();
    classify_aws_error(err.code(), Some(err.message().unwrap_or(&context)))
}

/// Convert raw SDK results into classified results
pub trait ClassifySdkError<T> {
    fn classified(self) -> Result<T, AwsError>;
}

impl<T, E> ClassifySdkError<T> for Result<T, E>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    fn classified(self) -> Result<T, AwsError> {
        self.map_err(|e| classify_sdk_error(&e))
    }
}

/// Find the classified AWS error inside an error chain, if any
pub fn find_aws_error(error: &anyhow::Error) -> Option<&AwsError> {
    error.chain().find_map(|cause| cause.downcast_ref::<AwsError>())
}

/// Whether an error chain carries an "already exists" condition
pub fn is_conflict(error: &anyhow::Error) -> bool {
    find_aws_error(error).is_some_and(AwsError::is_already_exists)
}

/// Map a "not found" result to `None`, passing every other outcome through
pub fn ignore_not_found<T>(result: Result<T, AwsError>) -> Result<Option<T>, AwsError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                err.is_already_exists(),
                "Expected AlreadyExists for code: {code}"
            );
        }
    }

    #[test]
    fn duplicate_log_policy_is_a_conflict() {
        let err = classify_aws_error(
            Some("InvalidParameterException"),
            Some("Policy with the same name already exists."),
        );
        assert!(err.is_already_exists());

        let other = classify_aws_error(Some("InvalidParameterException"), Some("bad name"));
        assert_eq!(other.code(), Some("InvalidParameterException"));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn conflict_is_found_through_context() {
        let err = Err::<(), _>(AwsError::AlreadyExists {
            message: "trail".to_string(),
        })
        .context("Failed to create trail")
        .unwrap_err();
        assert!(is_conflict(&err));

        let plain = anyhow::anyhow!("connection reset");
        assert!(!is_conflict(&plain));
        assert!(find_aws_error(&plain).is_none());
    }

    #[test]
    fn ignore_not_found_maps_to_none() {
        let missing: Result<(), AwsError> = Err(AwsError::NotFound {
            message: "x".to_string(),
        });
        assert!(matches!(ignore_not_found(missing), Ok(None)));
        let denied: Result<(), AwsError> = Err(AwsError::Sdk {
            code: Some("AccessDenied".to_string()),
            message: "x".to_string(),
        });
        assert!(ignore_not_found(denied).is_err());
        assert!(matches!(ignore_not_found(Ok(1)), Ok(Some(1))));
    }
}
