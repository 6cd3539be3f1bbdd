//! Failure Classification
//!
//! Translates backend failures into the three classes the dispatcher acts on.
//! This is the only place that inspects error text.

use std::fmt;

/// A failed backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,

    /// Canonical API status name, e.g. "RESOURCE_EXHAUSTED"
    pub reason: Option<String>,

    /// Human readable message
    pub message: String,
}

impl BackendError {
    /// Error returned with an HTTP response
    pub fn http(status: u16, reason: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            reason,
            message: message.into(),
        }
    }

    /// Error raised before any response arrived
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.reason) {
            (Some(code), Some(reason)) => write!(f, "{} {}: {}", code, reason, self.message),
            (Some(code), None) => write!(f, "{}: {}", code, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => BackendError::http(status.as_u16(), None, err.to_string()),
            None => BackendError::transport(err.to_string()),
        }
    }
}

/// What a failure says about the credential that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Rate limited or out of quota
    Quota,

    /// Credential rejected, invalid or revoked
    Auth,

    /// Anything else; retrying with the same credential may succeed
    Transient,
}

impl FailureClass {
    /// Quota and auth failures are attributed to the current key
    pub fn should_rotate(self) -> bool {
        matches!(self, FailureClass::Quota | FailureClass::Auth)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureClass::Quota => "quota",
            FailureClass::Auth => "auth",
            FailureClass::Transient => "transient",
        };
        f.write_str(label)
    }
}

/// Classify a backend failure. Structured fields win; message patterns are
/// the fallback for errors that carry no status.
pub fn classify(err: &BackendError) -> FailureClass {
    match (err.status, err.reason.as_deref()) {
        (Some(429), _) | (_, Some("RESOURCE_EXHAUSTED")) => FailureClass::Quota,
        (Some(401 | 403), _) | (_, Some("PERMISSION_DENIED" | "UNAUTHENTICATED")) => {
            FailureClass::Auth
        }
        _ => classify_message(&err.message),
    }
}

fn classify_message(message: &str) -> FailureClass {
    let lower = message.to_lowercase();

    if message.contains("429")
        || lower.contains("quota")
        || message.contains("ResourceExhausted")
        || lower.contains("rate limit")
    {
        return FailureClass::Quota;
    }

    if message.contains("403") || lower.contains("leaked") || message.contains("API key") {
        return FailureClass::Auth;
    }

    FailureClass::Transient
}
