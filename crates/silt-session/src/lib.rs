//! Session layer for the silt simulator.
//!
//! The session is a single-consumer event loop around a finite state
//! machine owning the live [`Grid`](silt_core::Grid) and its history.
//! Producers submit [`Command`](silt_core::Command)s wrapped in
//! [`Envelope`]s and receive replies asynchronously; lifecycle and
//! history navigation flow through [`Control`] and [`Input`] events.
//!
//! Two embeddings are provided: [`SessionWorld`] runs the consumer on a
//! dedicated thread with a real tick cadence, and [`StepLoop`] drives
//! the same machine synchronously for tests and host main loops.

pub mod config;
pub mod envelope;
pub mod event;
pub mod machine;
pub mod step_loop;
pub mod world;

pub use config::{SessionConfig, SessionConfigError};
pub use envelope::Envelope;
pub use event::{Control, Event, Input};
pub use machine::{SessionMachine, SessionState, Sim};
pub use step_loop::StepLoop;
pub use world::{SessionHandle, SessionWorld, SubmitError};
