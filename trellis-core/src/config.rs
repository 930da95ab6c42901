//! Runtime Configuration
//!
//! A [`RuntimeConfig`] travels with every scope tree created by
//! [`mount`](crate::mount::mount) or [`Scope::root`](crate::scope::Scope::root).
//! It selects between the legacy and hardened variants of the runtime's
//! behavior and names the conventions used by the element builder.
//!
//! Configuration can be built in code or loaded from JSON:
//!
//! ```rust
//! use trellis_core::config::{RuntimeConfig, TrackingMode};
//!
//! let config = RuntimeConfig::from_json(r#"{ "tracking": "dynamic" }"#).unwrap();
//! assert_eq!(config.tracking, TrackingMode::Dynamic);
//! assert_eq!(config.event_prefix, "@");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ReactiveError, Result};

/// How an effect's dependency set evolves across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Subscriptions only grow. A signal read in any past run keeps the effect
    /// subscribed, even if later runs no longer read it.
    #[default]
    Cumulative,

    /// Subscriptions are cleared before each run and rebuilt from the signals
    /// read during that run.
    Dynamic,
}

/// What disposal does when a cleanup action fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Run every remaining cleanup and child disposal, then report all failures.
    #[default]
    Continue,

    /// Stop the disposal at the first failure. The scope stays disposed and
    /// whatever had not run yet is dropped.
    Abort,
}

/// Settings for one scope tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Prefix marking event and two-way binding prop keys, e.g. `@clicked`.
    pub event_prefix: String,

    /// Dependency tracking mode for effects created in this tree.
    pub tracking: TrackingMode,

    /// Failure handling during scope disposal.
    pub cleanup_policy: CleanupPolicy,

    /// Dispose scope-bound effects (and drop their subscriptions) together
    /// with their scope. When `false`, effects outlive their scope and keep
    /// reacting to signal writes.
    pub dispose_effects_with_scope: bool,

    /// Node type created by `mount` to hold the root component.
    pub container_type: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_prefix: "@".to_string(),
            tracking: TrackingMode::default(),
            cleanup_policy: CleanupPolicy::default(),
            dispose_effects_with_scope: true,
            container_type: "Container".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReactiveError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings for values the builder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.event_prefix.is_empty() {
            return Err(ReactiveError::Config("event_prefix must not be empty".into()));
        }
        if self.container_type.is_empty() {
            return Err(ReactiveError::Config("container_type must not be empty".into()));
        }
        Ok(())
    }

    /// Strip the event prefix from a prop key, if present.
    pub fn event_name<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.event_prefix.as_str())
    }
}
