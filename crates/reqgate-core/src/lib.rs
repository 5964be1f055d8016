pub mod admission;
pub mod classifier;
pub mod config;
pub mod descriptor;
pub mod error;

pub use admission::{AdmissionController, AdmissionPolicy, Counters, GateStats};
pub use classifier::{PriorityClass, RequestClassifier};
pub use config::{GateConfig, ResetPolicy};
pub use descriptor::RequestDescriptor;
pub use error::ReqGateError;

/// Fluent builder for a gate configuration.
///
/// Routes registered here are added on top of whatever the configuration
/// already lists, so `with_config` followed by `route` extends the file's
/// set instead of replacing it.
pub struct GateBuilder {
    pub config: GateConfig,
}

impl GateBuilder {
    pub fn new() -> Self {
        Self {
            config: GateConfig::default(),
        }
    }

    /// Marks a route identifier as low priority.
    pub fn route(mut self, identifier: &str) -> Self {
        if !self.config.low_priority_routes.iter().any(|r| r == identifier) {
            self.config.low_priority_routes.push(identifier.to_string());
        }
        self
    }

    /// Overrides the configuration wholesale.
    pub fn with_config(mut self, config: GateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_limits(mut self, max_concurrent: usize, limit_concurrent: usize, threshold: usize) -> Self {
        self.config.max_concurrent = max_concurrent;
        self.config.limit_concurrent = limit_concurrent;
        self.config.prio_traffic_threshold = threshold;
        self
    }

    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    pub fn with_reset_policy(mut self, policy: ResetPolicy) -> Self {
        self.config.reset_policy = policy;
        self
    }

    /// Validates the configuration and hands it back.
    pub fn build(self) -> Result<GateConfig, ReqGateError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
