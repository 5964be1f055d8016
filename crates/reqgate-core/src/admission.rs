use serde::Serialize;

use crate::config::GateConfig;

/// The three numbers that make up the two-tier policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub max_concurrent: usize,
    pub limit_concurrent: usize,
    pub prio_traffic_threshold: usize,
}

impl AdmissionPolicy {
    pub fn from_config(config: &GateConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent,
            limit_concurrent: config.limit_concurrent,
            prio_traffic_threshold: config.prio_traffic_threshold,
        }
    }

    /// Low-priority cap for a given amount of high-priority traffic.
    pub fn limit_for(&self, high_in_flight: usize) -> usize {
        if high_in_flight >= self.prio_traffic_threshold {
            self.limit_concurrent
        } else {
            self.max_concurrent
        }
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counters {
    pub high_in_flight: usize,
    pub low_in_flight: usize,
}

/// Owns the in-flight counters and decides whether bulk traffic may start.
///
/// High-priority requests are never held back here. They are only counted,
/// so that their volume can tighten the low-priority cap.
///
/// Not synchronised: the owner is expected to be the single control loop.
#[derive(Debug, Clone)]
pub struct AdmissionController {
    policy: AdmissionPolicy,
    counters: Counters,
}

impl AdmissionController {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            counters: Counters::default(),
        }
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    pub fn effective_limit(&self) -> usize {
        self.policy.limit_for(self.counters.high_in_flight)
    }

    pub fn can_admit_low(&self) -> bool {
        self.counters.low_in_flight < self.effective_limit()
    }

    pub fn on_high_start(&mut self) {
        self.counters.high_in_flight += 1;
    }

    /// # Panics
    /// If no high-priority request is in flight. A done without a matching
    /// start means the pairing is broken somewhere upstream.
    pub fn on_high_done(&mut self) {
        assert!(
            self.counters.high_in_flight > 0,
            "on_high_done called with no high-priority request in flight"
        );
        self.counters.high_in_flight -= 1;
    }

    pub fn on_low_start(&mut self) {
        self.counters.low_in_flight += 1;
    }

    /// # Panics
    /// If no low-priority request is in flight.
    pub fn on_low_done(&mut self) {
        assert!(
            self.counters.low_in_flight > 0,
            "on_low_done called with no low-priority request in flight"
        );
        self.counters.low_in_flight -= 1;
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn high_in_flight(&self) -> usize {
        self.counters.high_in_flight
    }

    pub fn low_in_flight(&self) -> usize {
        self.counters.low_in_flight
    }

    pub fn reset(&mut self) {
        self.counters = Counters::default();
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(AdmissionPolicy::default())
    }
}

/// Point-in-time view of the scheduler, as reported by the debug log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GateStats {
    pub high_in_flight: usize,
    pub low_in_flight: usize,
    pub queued: usize,
    pub effective_limit: usize,
    /// Callers parked by resets under `ResetPolicy::Abandon`.
    pub abandoned: usize,
    /// Number of resets since start.
    pub generation: u64,
}
