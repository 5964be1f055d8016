use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use reqgate_core::{
    GateBuilder, GateConfig, GateStats, PriorityClass, ReqGateError, RequestClassifier,
    RequestDescriptor,
};
use tokio::sync::{mpsc, oneshot};
use crate::dispatcher::{Dispatcher, Outcome};
use crate::scheduler::{Command, Scheduler};
use crate::transport::Transport;

/// Caller-side handle for one intercepted request.
///
/// Settles with the transport's outcome whether the request was delayed in
/// the queue or passed straight through.
#[derive(Debug)]
pub struct ResponseHandle {
    class: PriorityClass,
    rx: oneshot::Receiver<Outcome>,
}

impl ResponseHandle {
    /// The class the request was assigned at interception time.
    pub fn class(&self) -> PriorityClass {
        self.class
    }
}

impl Future for ResponseHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|settled| match settled {
            Ok(outcome) => outcome,
            Err(_) => Err(ReqGateError::SchedulerClosed),
        })
    }
}

/// The boundary every outbound request passes through.
///
/// Cheap to clone. All clones talk to the same control loop, so the
/// counters and queue are shared by every caller.
///
/// The loop stops once the last clone is dropped. Requests still waiting in
/// the queue at that point settle with `ReqGateError::SchedulerClosed`, even
/// if their callers hold the handle; requests already on the wire still
/// settle normally. Keep a clone alive until every bulk handle has resolved.
#[derive(Clone)]
pub struct Interceptor {
    classifier: Arc<RequestClassifier>,
    dispatcher: Dispatcher,
    command_tx: mpsc::UnboundedSender<Command>,
}

impl Interceptor {
    /// Builds the interceptor and its control loop without starting it.
    ///
    /// The caller is responsible for driving `Scheduler::run_loop`, e.g. on a
    /// dedicated current-thread runtime.
    pub fn new<T: Transport>(config: GateConfig, transport: T) -> Result<(Self, Scheduler), ReqGateError> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
        let (settle_tx, settle_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher::new(Arc::new(transport), settle_tx);
        let scheduler = Scheduler::new(&config, dispatcher.clone(), command_rx, settle_rx);

        let interceptor = Self {
            classifier: Arc::new(RequestClassifier::from_config(&config)),
            dispatcher,
            command_tx,
        };
        Ok((interceptor, scheduler))
    }

    /// Builds the interceptor and spawns its control loop on the current runtime.
    pub fn spawn<T: Transport>(config: GateConfig, transport: T) -> Result<Self, ReqGateError> {
        let (interceptor, scheduler) = Self::new(config, transport)?;
        tokio::spawn(scheduler.run_loop());
        Ok(interceptor)
    }

    pub fn from_builder<T: Transport>(builder: GateBuilder, transport: T) -> Result<Self, ReqGateError> {
        Self::spawn(builder.build()?, transport)
    }

    pub fn classify(&self, descriptor: &RequestDescriptor) -> PriorityClass {
        self.classifier.classify(descriptor)
    }

    /// Intercepts one outbound request.
    ///
    /// Bypass requests go to the transport right here, without touching the
    /// control loop. Everything else is handed to the loop for counting and,
    /// for bulk traffic, admission. Must be called within a tokio runtime.
    pub fn submit(&self, descriptor: RequestDescriptor) -> ResponseHandle {
        let class = self.classifier.classify(&descriptor);
        let (reply, rx) = oneshot::channel();

        match class {
            PriorityClass::Bypass => {
                tracing::trace!("Interceptor: bypassing {}", descriptor.url());
                self.dispatcher.forward(descriptor, reply);
            }
            PriorityClass::High | PriorityClass::Low => {
                let command = Command::Submit { class, descriptor, reply };
                if let Err(mpsc::error::SendError(command)) = self.command_tx.send(command) {
                    if let Command::Submit { reply, .. } = command {
                        let _ = reply.send(Err(ReqGateError::SchedulerClosed));
                    }
                }
            }
        }

        ResponseHandle { class, rx }
    }

    /// Submits and waits for the outcome.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Outcome {
        self.submit(descriptor).await
    }

    /// Zeroes both counters and empties the queue.
    pub fn reset(&self) -> Result<(), ReqGateError> {
        self.command_tx
            .send(Command::Reset)
            .map_err(|_| ReqGateError::SchedulerClosed)
    }

    pub async fn stats(&self) -> Result<GateStats, ReqGateError> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(Command::Stats(tx))
            .map_err(|_| ReqGateError::SchedulerClosed)?;
        rx.await.map_err(|_| ReqGateError::SchedulerClosed)
    }

    /// Stops the control loop. Later submissions settle with
    /// `ReqGateError::SchedulerClosed`.
    pub fn shutdown(&self) {
        if self.command_tx.send(Command::Shutdown).is_err() {
            tracing::debug!("Interceptor: scheduler already stopped");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}
