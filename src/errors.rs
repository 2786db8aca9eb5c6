/// Domain-specific error types for the option pricer.
/// Pricing failures are local precondition or numeric checks. The pricer must:
/// - Reject bad inputs before any arithmetic runs
/// - Never return NaN or Infinity as a price
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("missing required fields")]
    MissingField,

    #[error("invalid argument `{field}`: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("computation error: {0}")]
    Computation(String),

    #[error("config error: {0}")]
    Config(String),
}

impl PricingError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PricingError::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending request field, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            PricingError::InvalidArgument { field, .. } => Some(*field),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for PricingError {
    fn from(e: tokio::task::JoinError) -> Self {
        PricingError::Computation(format!("pricing task failed: {e}"))
    }
}

pub type PricerResult<T> = Result<T, PricingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_becomes_computation_error() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        let err = PricingError::from(join_err);
        assert!(matches!(err, PricingError::Computation(_)), "{err}");
        assert_eq!(err.field(), None);
    }
}
