use thiserror::Error;

/// Failure classes surfaced by the library.
///
/// Capability implementations report through `anyhow`; use [`Error::classify`]
/// to fold such an error back into this taxonomy at the call site.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or contradictory configuration. Fatal at startup.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external collaborator (embedding, vector store, graph store, LLM) failed.
    #[error("{service} call failed: {message}")]
    Service { service: &'static str, message: String },

    /// Structured data from a collaborator did not have the expected shape.
    #[error("Malformed response: {0}")]
    Format(String),

    /// The caller sent something unusable.
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn service(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Service { service, message: err.to_string() }
    }

    /// Keep typed errors raised inside a collaborator, wrap anything else as a
    /// service failure of `service`.
    pub fn classify(service: &'static str, err: anyhow::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(typed) => typed,
            Err(other) => Self::Service { service, message: format!("{other:#}") },
        }
    }

    /// Short machine-readable class name, used in logs and error frames.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "config",
            Self::Service { .. } => "service",
            Self::Format(_) => "format",
            Self::Input(_) => "input",
            Self::NotFound(_) => "not_found",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_keeps_typed_errors() {
        let err = anyhow::Error::new(Error::Format("missing field".into()));
        assert!(matches!(Error::classify("llm", err), Error::Format(_)));
    }

    #[test]
    fn classify_wraps_foreign_errors_with_context() {
        let err = anyhow::anyhow!("connection refused").context("querying chunks");
        match Error::classify("vector store", err) {
            Error::Service { service, message } => {
                assert_eq!(service, "vector store");
                assert!(message.contains("querying chunks"));
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
