//! # reqgate-transport: Transport Seam
//!
//! The scheduler never moves bytes itself. Whatever performs the actual
//! network call plugs in here.

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use reqgate_core::RequestDescriptor;
use std::future::Future;

/// Whatever the transport produced. The scheduler never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

pub type TransportFuture = BoxFuture<'static, std::io::Result<Response>>;

/// Performs exactly one network call per `send` and settles exactly once.
///
/// `send` runs on the scheduler's control loop (or, for bypassed requests,
/// on the caller's task) and should return quickly. The returned future is
/// driven on its own task. A panic in either phase settles the caller with
/// `ReqGateError::Interrupted` and releases the request's slot.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: RequestDescriptor) -> TransportFuture;
}

impl<F, Fut> Transport for F
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::io::Result<Response>> + Send + 'static,
{
    fn send(&self, request: RequestDescriptor) -> TransportFuture {
        (self)(request).boxed()
    }
}
