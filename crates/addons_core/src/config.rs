//! Register configuration.

use serde::{Deserialize, Serialize};

/// What the register does when an addon's hook fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failing pass ends the session with every error of that pass.
    #[default]
    Abort,
    /// Failures are recorded and skipped along with everything depending on
    /// them; independent addons keep going.
    ///
    /// Import failures and dependency cycles stay fatal.
    Isolate,
}

/// Configuration for a [`Register`](crate::Register).
///
/// # Example
///
/// ```
/// use addons_core::{FailurePolicy, RegisterConfig};
///
/// let config: RegisterConfig = serde_json::from_str(r#"{"failure_policy": "isolate"}"#).unwrap();
/// assert_eq!(config, RegisterConfig::new().with_failure_policy(FailurePolicy::Isolate));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// How hook failures are handled.
    pub failure_policy: FailurePolicy,
}

impl RegisterConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
