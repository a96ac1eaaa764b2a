//! Threaded session embedding.
//!
//! [`SessionWorld`] spawns one named consumer thread that exclusively
//! owns a [`SessionMachine`] and drains a bounded event channel. Command
//! producers hold cloneable [`SessionHandle`]s and block only on their
//! own reply channel, never on simulation progress. While the machine is
//! running, the consumer synthesizes `Tick` events at the configured
//! rate between arrivals.
//!
//! ```text
//! Producer Thread(s)               Consumer Thread ("silt-session")
//!     |                                |
//!     |--submit(cmd)------------------>| event_rx.recv_timeout(next_tick)
//!     |   [event_tx: bounded(cap)]     | machine.handle_event(event)
//!     |<--reply via oneshot channel----| envelope resolved exactly once
//!     |                                | Tick on timeout while running
//! ```

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use silt_core::{ApiError, Command, Grid, Reply};
use silt_physics::PhysicsConfig;

use crate::config::{SessionConfig, SessionConfigError};
use crate::envelope::Envelope;
use crate::event::{Control, Event, Input};
use crate::machine::SessionMachine;

// ── Error types ──────────────────────────────────────────────────────

/// Error submitting an event to the consumer thread.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The session has shut down.
    Shutdown,
    /// The event queue is full (back-pressure).
    QueueFull,
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shutdown => write!(f, "session has shut down"),
            Self::QueueFull => write!(f, "session event queue full"),
        }
    }
}

impl std::error::Error for SubmitError {}

// ── SessionHandle ────────────────────────────────────────────────────

/// Cloneable producer handle to a running [`SessionWorld`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    event_tx: Sender<Event>,
}

impl SessionHandle {
    /// Enqueue a command. Non-blocking: returns the channel the reply
    /// will arrive on. Once accepted the command cannot be withdrawn;
    /// dropping the receiver makes reply delivery a silent no-op.
    pub fn submit(&self, command: Command) -> Result<Receiver<Reply>, SubmitError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let envelope = Envelope::new(command, reply_tx);
        match self.event_tx.try_send(Event::Command(envelope)) {
            Ok(()) => Ok(reply_rx),
            Err(TrySendError::Full(event)) => {
                Self::discard(event);
                Err(SubmitError::QueueFull)
            }
            Err(TrySendError::Disconnected(event)) => {
                Self::discard(event);
                Err(SubmitError::Shutdown)
            }
        }
    }

    /// Enqueue a lifecycle control event.
    pub fn control(&self, control: Control) -> Result<(), SubmitError> {
        self.send(Event::Control(control))
    }

    /// Enqueue a direct input event.
    pub fn input(&self, input: Input) -> Result<(), SubmitError> {
        self.send(Event::Input(input))
    }

    fn send(&self, event: Event) -> Result<(), SubmitError> {
        self.event_tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Disconnected(_) => SubmitError::Shutdown,
        })
    }

    // A command rejected at the queue never reached the consumer, so
    // its envelope is cancelled rather than resolved.
    fn discard(event: Event) {
        if let Event::Command(envelope) = event {
            envelope.cancel();
        }
    }
}

// ── SessionWorld ─────────────────────────────────────────────────────

/// A session machine running on its own consumer thread.
pub struct SessionWorld {
    event_tx: Option<Sender<Event>>,
    consumer: Option<JoinHandle<()>>,
}

impl SessionWorld {
    /// Validate the configuration and spawn the consumer thread. The
    /// machine starts in `Disconnected`.
    pub fn new(
        config: SessionConfig,
        initial: Grid,
        physics: PhysicsConfig,
    ) -> Result<Self, SessionConfigError> {
        let (event_tx, event_rx) = crossbeam_channel::bounded(config.queue_capacity);
        let tick_budget = Duration::from_secs_f64(1.0 / config.tick_rate_hz);
        let machine = SessionMachine::new(config, initial, physics)?;

        let consumer = thread::Builder::new()
            .name("silt-session".into())
            .spawn(move || consumer_loop(machine, event_rx, tick_budget))
            .expect("failed to spawn session thread");

        Ok(Self {
            event_tx: Some(event_tx),
            consumer: Some(consumer),
        })
    }

    /// A new producer handle.
    ///
    /// # Panics
    ///
    /// Panics if called after [`shutdown`](Self::shutdown).
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            event_tx: self
                .event_tx
                .as_ref()
                .expect("handle() after shutdown")
                .clone(),
        }
    }

    /// Ask the machine to exit and join the consumer thread. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(event_tx) = self.event_tx.take() {
            // Best effort: the loop also exits when the channel closes.
            let _ = event_tx.send(Event::Control(Control::Exit));
            drop(event_tx);
        }
        if let Some(consumer) = self.consumer.take() {
            if consumer.join().is_err() {
                log::error!("session consumer thread panicked");
            }
        }
    }
}

impl Drop for SessionWorld {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Consumer main loop. Exits when the machine reaches `Shutdown` or
/// every producer handle is gone.
fn consumer_loop(mut machine: SessionMachine, event_rx: Receiver<Event>, tick_budget: Duration) {
    let mut next_tick = Instant::now() + tick_budget;
    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        match event_rx.recv_timeout(timeout) {
            Ok(event) => machine.handle_event(event),
            Err(RecvTimeoutError::Timeout) => {
                machine.handle_event(Event::Tick);
                next_tick = Instant::now() + tick_budget;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if machine.is_shutdown() {
            break;
        }
    }
    // Commands enqueued behind the exit still get an answer.
    for event in event_rx.try_iter() {
        if let Event::Command(envelope) = event {
            envelope.resolve(Err(ApiError::new("session shut down")));
        }
    }
    log::info!("session consumer exiting");
}
