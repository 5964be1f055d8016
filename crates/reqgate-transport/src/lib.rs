pub use reqgate_core::{GateConfig, PriorityClass, RequestDescriptor, ReqGateError};
pub mod transport;
pub mod dispatcher;
pub mod scheduler;
pub mod interceptor;

pub use transport::{Response, Transport, TransportFuture};
pub use dispatcher::Outcome;
pub use scheduler::Scheduler;
pub use interceptor::{Interceptor, ResponseHandle};
