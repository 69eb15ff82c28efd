//! Error taxonomy of the replica-exchange engine: bad configuration,
//! failing caller capabilities and unreadable configuration files.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and slot/ladder context carried by every [`PtError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case code asserted by tests, e.g. `ladder-too-short`.
    pub code: String,
    /// One-line description of what was rejected.
    pub message: String,
    /// Contextual key value pairs (indices, lengths, offending values).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested configuration change, when one is obvious.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records an offending value (slot, length, temperature, ...).
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the replica-exchange engine.
///
/// The engine never wraps or rewrites errors returned by caller-supplied
/// capabilities: whatever a capability returns is handed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PtError {
    /// Malformed ladder, mismatched initial states, unknown names or parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(ErrorInfo),
    /// Failure reported by an energy function, local update or callback.
    #[error("external capability failure: {0}")]
    ExternalCapabilityFailure(ErrorInfo),
    /// Serialization and configuration-file errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut context = self.context.iter();
        if let Some((key, value)) = context.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in context {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl PtError {
    /// Shorthand for an [`PtError::InvalidConfiguration`] with a fresh payload.
    pub fn invalid(code: impl Into<String>, message: impl Into<String>) -> Self {
        PtError::InvalidConfiguration(ErrorInfo::new(code, message))
    }

    /// Shorthand for an [`PtError::ExternalCapabilityFailure`] with a fresh payload.
    pub fn external(code: impl Into<String>, message: impl Into<String>) -> Self {
        PtError::ExternalCapabilityFailure(ErrorInfo::new(code, message))
    }

    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PtError::InvalidConfiguration(info)
            | PtError::ExternalCapabilityFailure(info)
            | PtError::Serde(info) => info,
        }
    }

    /// Stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Returns true for configuration errors.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, PtError::InvalidConfiguration(_))
    }
}
