use serde::Deserialize;
use std::path::Path;

use crate::error::ReqGateError;

/// Route identifiers treated as bulk traffic out of the box.
pub const DEFAULT_LOW_PRIORITY_ROUTES: [&str; 3] =
    ["GetLayerTile", "GetWFSFeatures", "GetWFSVectorTile"];

/// What happens to queued requests when the scheduler is reset.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Queued callers are dropped from the queue and their handles never
    /// settle for as long as the scheduler lives.
    #[default]
    Abandon,
    /// Queued callers are settled with `ReqGateError::Abandoned`.
    Reject,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GateConfig {
    /// Low-priority concurrency cap while interactive traffic is light.
    pub max_concurrent: usize,
    /// Low-priority concurrency cap once interactive traffic is heavy.
    pub limit_concurrent: usize,
    /// High-priority in-flight count at which the tighter cap applies.
    pub prio_traffic_threshold: usize,
    pub low_priority_routes: Vec<String>,
    /// Query parameter carrying the route identifier on `/action` URLs.
    pub route_param: String,
    /// Let plaintext, non-loopback requests through untouched.
    pub bypass_mixed_content: bool,
    /// Log counters and queue depth on every admission event.
    pub debug: bool,
    pub reset_policy: ResetPolicy,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 6,
            limit_concurrent: 2,
            prio_traffic_threshold: 3,
            low_priority_routes: DEFAULT_LOW_PRIORITY_ROUTES
                .iter()
                .map(|r| r.to_string())
                .collect(),
            route_param: "action_route".to_string(),
            bypass_mixed_content: true,
            debug: false,
            reset_policy: ResetPolicy::Abandon,
        }
    }
}

impl GateConfig {
    /// Parses a TOML document. Missing keys fall back to the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ReqGateError> {
        let config: GateConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReqGateError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ReqGateError::ConfigParse(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!("Loaded gate configuration from {}", path.display());
        Ok(config)
    }

    /// Rejects limit combinations that would stall or invert the policy.
    pub fn validate(&self) -> Result<(), ReqGateError> {
        if self.max_concurrent == 0 {
            return Err(ReqGateError::InvalidConfig(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.limit_concurrent == 0 {
            return Err(ReqGateError::InvalidConfig(
                "limit_concurrent must be at least 1".to_string(),
            ));
        }
        if self.limit_concurrent > self.max_concurrent {
            return Err(ReqGateError::InvalidConfig(format!(
                "limit_concurrent ({}) exceeds max_concurrent ({})",
                self.limit_concurrent, self.max_concurrent
            )));
        }
        if self.prio_traffic_threshold == 0 {
            return Err(ReqGateError::InvalidConfig(
                "prio_traffic_threshold must be at least 1".to_string(),
            ));
        }
        if self.route_param.is_empty() {
            return Err(ReqGateError::InvalidConfig(
                "route_param must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
