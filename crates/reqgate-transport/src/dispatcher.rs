use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use futures::FutureExt;
use reqgate_core::{PriorityClass, ReqGateError, RequestDescriptor};
use reqgate_dsa::Ticket;
use tokio::sync::{mpsc, oneshot};
use crate::transport::{Response, Transport, TransportFuture};

/// What a caller's handle eventually settles with.
pub type Outcome = Result<Response, ReqGateError>;

/// Completion report sent from a transport task back to the control loop.
#[derive(Debug)]
pub(crate) struct Settlement {
    pub class: PriorityClass,
    /// Scheduler generation the slot was taken in.
    pub generation: u64,
    pub ticket: Option<Ticket>,
    /// `None` when the transport future unwound instead of settling.
    pub outcome: Option<Outcome>,
    pub reply: Option<oneshot::Sender<Outcome>>,
}

impl Settlement {
    /// Resolves the caller's handle. Consumes the reply sender.
    pub fn resolve(&mut self) {
        let Some(reply) = self.reply.take() else { return };
        let outcome = self.outcome.take().unwrap_or(Err(ReqGateError::Interrupted));
        // The caller may have dropped its handle; the request still counted.
        let _ = reply.send(outcome);
    }
}

/// Releases a counted slot exactly once.
///
/// Either `settle` reports the transport's outcome, or `Drop` reports an
/// outcome-less settlement if the task unwound first. Both paths send one
/// message to the control loop, so every `on_*_start` meets its `on_*_done`.
struct SlotGuard {
    settle_tx: Option<mpsc::UnboundedSender<Settlement>>,
    class: PriorityClass,
    generation: u64,
    ticket: Option<Ticket>,
    reply: Option<oneshot::Sender<Outcome>>,
}

impl SlotGuard {
    fn settle(mut self, outcome: Outcome) {
        self.report(Some(outcome));
    }

    fn report(&mut self, outcome: Option<Outcome>) {
        let Some(settle_tx) = self.settle_tx.take() else { return };
        let settlement = Settlement {
            class: self.class,
            generation: self.generation,
            ticket: self.ticket,
            outcome,
            reply: self.reply.take(),
        };
        // Control loop is gone: nobody is counting any more, answer directly.
        if let Err(mpsc::error::SendError(mut orphan)) = settle_tx.send(settlement) {
            orphan.resolve();
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.settle_tx.is_some() {
            tracing::error!(
                "Dispatcher: {:?} transport task unwound before settling. Releasing slot.",
                self.class
            );
            self.report(None);
        }
    }
}

/// Hands admitted requests to the transport and reports their settlement.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    settle_tx: mpsc::UnboundedSender<Settlement>,
}

impl Dispatcher {
    pub(crate) fn new(transport: Arc<dyn Transport>, settle_tx: mpsc::UnboundedSender<Settlement>) -> Self {
        Self { transport, settle_tx }
    }

    /// Starts a counted transport call.
    ///
    /// Returns immediately. The settlement arrives later on the control
    /// loop's settlement channel, carrying `reply` so the loop can release
    /// the slot before resolving the caller.
    pub(crate) fn dispatch(
        &self,
        class: PriorityClass,
        generation: u64,
        ticket: Option<Ticket>,
        descriptor: RequestDescriptor,
        reply: oneshot::Sender<Outcome>,
    ) {
        let guard = SlotGuard {
            settle_tx: Some(self.settle_tx.clone()),
            class,
            generation,
            ticket,
            reply: Some(reply),
        };
        // A panic in `send` drops the guard here, which releases the slot
        // through the settlement channel like any other unwind.
        let Some(call) = self.start_call(descriptor) else { return };

        tokio::spawn(async move {
            let outcome = call.await.map_err(ReqGateError::from);
            guard.settle(outcome);
        });
    }

    /// Passes a request straight through. Nothing is counted and the
    /// settlement goes to the caller without visiting the control loop.
    pub(crate) fn forward(&self, descriptor: RequestDescriptor, reply: oneshot::Sender<Outcome>) {
        let Some(call) = self.start_call(descriptor) else {
            let _ = reply.send(Err(ReqGateError::Interrupted));
            return;
        };

        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result.map_err(ReqGateError::from),
                Err(_) => {
                    tracing::error!("Dispatcher: bypassed transport call unwound before settling");
                    Err(ReqGateError::Interrupted)
                }
            };
            let _ = reply.send(outcome);
        });
    }

    /// Calls `Transport::send` without letting a panic escape.
    ///
    /// `send` runs on the control loop for counted requests; an unwind there
    /// would take the loop and every caller down with it.
    fn start_call(&self, descriptor: RequestDescriptor) -> Option<TransportFuture> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.transport.send(descriptor))) {
            Ok(call) => Some(call),
            Err(_) => {
                tracing::error!("Dispatcher: transport panicked while starting a call");
                None
            }
        }
    }
}
