use reqgate_core::{
    AdmissionController, AdmissionPolicy, GateConfig, GateStats, PriorityClass, ReqGateError,
    RequestDescriptor, ResetPolicy,
};
use reqgate_dsa::{PendingQueue, Ticket};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use crate::dispatcher::{Dispatcher, Outcome, Settlement};

/// A low-priority request waiting for a slot.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub descriptor: RequestDescriptor,
    pub enqueued_at: Instant,
    reply: oneshot::Sender<Outcome>,
}

#[derive(Debug)]
pub(crate) enum Command {
    Submit {
        class: PriorityClass,
        descriptor: RequestDescriptor,
        reply: oneshot::Sender<Outcome>,
    },
    Reset,
    Stats(oneshot::Sender<GateStats>),
    Shutdown,
}

/// The control loop. Sole owner of the counters and the pending queue.
///
/// Every admission decision, release and drain happens on this task, one
/// message at a time, so the counters need no locking. Transport calls run
/// on their own tasks and report back over the settlement channel.
pub struct Scheduler {
    admission: AdmissionController,
    queue: PendingQueue<PendingRequest>,
    dispatcher: Dispatcher,
    command_rx: mpsc::UnboundedReceiver<Command>,
    settle_rx: mpsc::UnboundedReceiver<Settlement>,
    reset_policy: ResetPolicy,
    debug: bool,
    /// Bumped on every reset. Settlements from older generations no longer
    /// own a slot in the current counters.
    generation: u64,
    /// Reply senders parked by `ResetPolicy::Abandon`. Holding them keeps
    /// the callers' handles pending instead of failing them.
    abandoned: Vec<oneshot::Sender<Outcome>>,
}

impl Scheduler {
    pub(crate) fn new(
        config: &GateConfig,
        dispatcher: Dispatcher,
        command_rx: mpsc::UnboundedReceiver<Command>,
        settle_rx: mpsc::UnboundedReceiver<Settlement>,
    ) -> Self {
        Self {
            admission: AdmissionController::new(AdmissionPolicy::from_config(config)),
            queue: PendingQueue::new(),
            dispatcher,
            command_rx,
            settle_rx,
            reset_policy: config.reset_policy,
            debug: config.debug,
            generation: 0,
            abandoned: Vec::new(),
        }
    }

    /// Runs until `shutdown` is requested or every interceptor handle is gone.
    ///
    /// On exit, queued and parked callers are dropped and see
    /// `ReqGateError::SchedulerClosed`. Calls already on the wire still
    /// settle their callers directly.
    pub async fn run_loop(mut self) {
        tracing::info!(
            "Scheduler: control loop started (max: {}, limit: {}, threshold: {})",
            self.admission.policy().max_concurrent,
            self.admission.policy().limit_concurrent,
            self.admission.policy().prio_traffic_threshold,
        );

        loop {
            tokio::select! {
                biased;
                Some(settlement) = self.settle_rx.recv() => {
                    self.on_settled(settlement);
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command),
                    }
                }
            }
        }

        tracing::info!(
            "Scheduler: control loop stopped ({} queued, {} abandoned dropped)",
            self.queue.len(),
            self.abandoned.len()
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { class, descriptor, reply } => match class {
                PriorityClass::Low => self.submit_low(descriptor, reply),
                // Bypass never reaches the loop; treat a stray one as interactive.
                PriorityClass::High | PriorityClass::Bypass => self.submit_high(descriptor, reply),
            },
            Command::Reset => self.reset(),
            Command::Stats(reply) => {
                let _ = reply.send(self.stats());
            }
            Command::Shutdown => {}
        }
    }

    fn submit_high(&mut self, descriptor: RequestDescriptor, reply: oneshot::Sender<Outcome>) {
        self.admission.on_high_start();
        self.debug_log("high start");
        self.dispatcher
            .dispatch(PriorityClass::High, self.generation, None, descriptor, reply);
    }

    fn submit_low(&mut self, descriptor: RequestDescriptor, reply: oneshot::Sender<Outcome>) {
        let ticket = self.queue.enqueue(PendingRequest {
            descriptor,
            enqueued_at: Instant::now(),
            reply,
        });
        tracing::trace!("Scheduler: low-priority request {} queued", ticket);
        self.drain();
    }

    /// Admits queued requests head-first until the effective limit is reached.
    ///
    /// Safe to call at any time: it only ever moves entries that fit under
    /// the limit observed right before each pop.
    fn drain(&mut self) -> usize {
        let mut admitted = 0;
        while self.admission.can_admit_low() {
            let Some((ticket, pending)) = self.queue.pop_front() else { break };
            self.admission.on_low_start();
            admitted += 1;
            self.debug_admitted(ticket, &pending);
            self.dispatcher.dispatch(
                PriorityClass::Low,
                self.generation,
                Some(ticket),
                pending.descriptor,
                pending.reply,
            );
        }
        admitted
    }

    fn on_settled(&mut self, mut settlement: Settlement) {
        if settlement.generation == self.generation {
            match settlement.class {
                PriorityClass::Low => {
                    self.admission.on_low_done();
                    self.debug_log("low done");
                    self.drain();
                }
                PriorityClass::High | PriorityClass::Bypass => {
                    self.admission.on_high_done();
                    self.debug_log("high done");
                }
            }
        } else {
            tracing::debug!(
                "Scheduler: {:?} request {:?} settled after reset (gen {} < {}). Counters untouched.",
                settlement.class,
                settlement.ticket,
                settlement.generation,
                self.generation
            );
        }

        settlement.resolve();
    }

    fn reset(&mut self) {
        let dropped = self.queue.take_all();
        self.admission.reset();
        self.generation += 1;

        if !dropped.is_empty() {
            tracing::warn!(
                "Scheduler: reset dropped {} queued request(s) (policy: {:?})",
                dropped.len(),
                self.reset_policy
            );
        }

        for (_, pending) in dropped {
            match self.reset_policy {
                ResetPolicy::Abandon => self.abandoned.push(pending.reply),
                ResetPolicy::Reject => {
                    let _ = pending.reply.send(Err(ReqGateError::Abandoned));
                }
            }
        }

        tracing::info!("Scheduler: reset complete (generation {})", self.generation);
    }

    fn stats(&self) -> GateStats {
        let counters = self.admission.counters();
        GateStats {
            high_in_flight: counters.high_in_flight,
            low_in_flight: counters.low_in_flight,
            queued: self.queue.len(),
            effective_limit: self.admission.effective_limit(),
            abandoned: self.abandoned.len(),
            generation: self.generation,
        }
    }

    fn debug_log(&self, event: &str) {
        if !self.debug {
            return;
        }
        let counters = self.admission.counters();
        tracing::debug!(
            high = counters.high_in_flight,
            low = counters.low_in_flight,
            queued = self.queue.len(),
            "Scheduler: {}",
            event
        );
    }

    fn debug_admitted(&self, ticket: Ticket, pending: &PendingRequest) {
        if !self.debug {
            return;
        }
        tracing::debug!(
            waited_ms = pending.enqueued_at.elapsed().as_millis() as u64,
            url = pending.descriptor.url(),
            "Scheduler: admitted {}",
            ticket
        );
        self.debug_log("low start");
    }
}
