//! Silt: a cellular material simulator.
//!
//! A rectangular grid of material cells (dirt, sand, water, stone)
//! evolves under gravity, flow, and structural-support rules. A session
//! state machine mediates all access through a typed command protocol,
//! and a history manager supports navigating backward through recorded
//! snapshots and resuming or resetting from anywhere.
//!
//! This is the top-level facade crate re-exporting the public API from
//! the silt sub-crates; for most users, depending on `silt` alone is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use silt::prelude::*;
//!
//! let mut session = StepLoop::new(
//!     SessionConfig::default(),
//!     Grid::new(16, 16).unwrap(),
//!     PhysicsConfig::default(),
//! )
//! .unwrap();
//!
//! // Connect, start a simulation, and place some dirt.
//! session.control(Control::Connect);
//! session.control(Control::StartSim);
//! let set = session.submit(Command::CellSet {
//!     x: 8,
//!     y: 2,
//!     material: Material::Dirt,
//!     fill: 0.8,
//! });
//! let stepped = session.submit(Command::StepN { frames: 30 });
//! session.pump();
//!
//! assert_eq!(set.try_recv().unwrap(), Ok(Okay::Ack));
//! assert!(matches!(stepped.try_recv().unwrap(), Ok(Okay::Stepped(_))));
//!
//! // The dirt has fallen toward the bottom of the grid.
//! let get = session.submit(Command::CellGet { x: 8, y: 2 });
//! session.pump();
//! match get.try_recv().unwrap() {
//!     Ok(Okay::Cell(cell)) => assert_eq!(cell.material, Material::Empty),
//!     other => panic!("unexpected reply: {other:?}"),
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `silt-core` | Grid, cells, materials, command protocol |
//! | [`physics`] | `silt-physics` | Support analysis and the step function |
//! | [`history`] | `silt-history` | Snapshot history and the binary codec |
//! | [`session`] | `silt-session` | Session state machine and embeddings |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Grid, cells, materials, and the command protocol (`silt-core`).
pub use silt_core as core;

/// Support analysis and the pure step function (`silt-physics`).
///
/// [`physics::step`] produces the next grid; [`physics::analyze_support`]
/// computes the structural-support classification on its own.
pub use silt_physics as physics;

/// Snapshot history, time-reversal navigation, and the persisted-state
/// codec (`silt-history`).
pub use silt_history as history;

/// The session state machine and its embeddings (`silt-session`).
///
/// [`session::SessionWorld`] runs the consumer on a dedicated thread;
/// [`session::StepLoop`] drives it synchronously.
pub use silt_session as session;

/// Common imports for typical silt usage.
///
/// ```rust
/// use silt::prelude::*;
/// ```
pub mod prelude {
    pub use silt_core::{
        ApiError, Cell, CellField, Command, Grid, GridSnapshot, Material, MaterialTable, Okay,
        Phase, Reply, StepId, Vec2,
    };

    pub use silt_physics::{analyze_support, step, PhysicsConfig, SupportMap};

    pub use silt_history::{Cursor, HistoryManager};

    pub use silt_session::{
        Control, Input, SessionConfig, SessionHandle, SessionMachine, SessionState, SessionWorld,
        StepLoop,
    };
}
