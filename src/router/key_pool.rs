//! API Key Pool
//!
//! Ordered Gemini keys with a rotating cursor. The pool is owned by one
//! dispatcher and mutated through `&mut self` only.

use crate::error::{OrbitError, Result};

/// A single API key with usage tracking
#[derive(Debug, Clone)]
pub struct ApiKey {
    /// The actual API key value
    value: String,

    /// Requests made with this key
    request_count: u64,

    /// Failures attributed to this key (quota or auth)
    failure_count: u64,
}

impl ApiKey {
    /// Create a new API key
    pub fn new(value: String) -> Self {
        Self {
            value,
            request_count: 0,
            failure_count: 0,
        }
    }

    /// Get the key value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Key suitable for logs: first and last four characters only
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.value.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }
}

/// Pool of API keys with rotation support
#[derive(Debug, Clone)]
pub struct KeyPool {
    /// Keys in configured order, never empty
    keys: Vec<ApiKey>,

    /// Index of the active key
    cursor: usize,

    /// Successful rotations since session start
    rotations: u64,
}

impl KeyPool {
    /// Create a pool; blank entries are dropped and an empty result is an error
    pub fn new(keys: Vec<String>) -> Result<Self> {
        let keys: Vec<ApiKey> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(ApiKey::new)
            .collect();

        if keys.is_empty() {
            return Err(OrbitError::NoCredentials);
        }

        Ok(Self {
            keys,
            cursor: 0,
            rotations: 0,
        })
    }

    /// Get the number of keys in the pool
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the active key
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The active key
    pub fn current(&self) -> &ApiKey {
        &self.keys[self.cursor % self.keys.len()]
    }

    /// Advance to the next key. Returns false, leaving the cursor alone, when
    /// the pool holds a single key.
    pub fn rotate(&mut self) -> bool {
        if self.keys.len() <= 1 {
            return false;
        }

        self.cursor = (self.cursor + 1) % self.keys.len();
        self.rotations += 1;
        true
    }

    /// Record a request made with the active key
    pub fn record_request(&mut self) {
        let idx = self.cursor % self.keys.len();
        self.keys[idx].request_count += 1;
    }

    /// Record a quota or auth failure against the active key
    pub fn record_failure(&mut self) {
        let idx = self.cursor % self.keys.len();
        self.keys[idx].failure_count += 1;
    }

    /// Get statistics about the pool
    pub fn stats(&self) -> KeyPoolStats {
        KeyPoolStats {
            total_keys: self.keys.len(),
            cursor: self.cursor,
            rotations: self.rotations,
            total_requests: self.keys.iter().map(|k| k.request_count).sum(),
            total_failures: self.keys.iter().map(|k| k.failure_count).sum(),
        }
    }
}

/// Statistics about a key pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPoolStats {
    pub total_keys: usize,
    pub cursor: usize,
    pub rotations: u64,
    pub total_requests: u64,
    pub total_failures: u64,
}
