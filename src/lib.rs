//! # reqgate
//!
//! Priority-aware admission control for outbound requests. Interactive
//! traffic always goes out immediately; bulk traffic (tiles, feature dumps)
//! is capped, and the cap tightens while interactive traffic is heavy.

pub use reqgate_core::{
    AdmissionController, AdmissionPolicy, Counters, GateBuilder, GateConfig, GateStats,
    PriorityClass, ReqGateError, RequestClassifier, RequestDescriptor, ResetPolicy,
};
pub use reqgate_dsa::{PendingQueue, Ticket};
pub use reqgate_transport::{
    Interceptor, Outcome, Response, ResponseHandle, Scheduler, Transport, TransportFuture,
};
