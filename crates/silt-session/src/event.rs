//! Session event types.
//!
//! Everything the consumer thread reacts to is one of these closed
//! unions, so each state's handler is forced to be exhaustive.

use crate::envelope::Envelope;

/// Connection and lifecycle transitions, distinct from wire commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// A client connected; leave `Disconnected`.
    Connect,
    /// Start (or restart) a simulation from the start menu.
    StartSim,
    /// Suspend time advancement.
    Pause,
    /// Resume time advancement.
    Resume,
    /// Tear the session down.
    Exit,
    /// The transport lost its connection.
    ConnectionLost,
}

impl Control {
    pub fn name(self) -> &'static str {
        match self {
            Control::Connect => "connect",
            Control::StartSim => "start_sim",
            Control::Pause => "pause",
            Control::Resume => "resume",
            Control::Exit => "exit",
            Control::ConnectionLost => "connection_lost",
        }
    }
}

/// Direct input events; history navigation is driven by these while
/// paused rather than by wire commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Step one snapshot into the past (entering navigation if live).
    HistoryBack,
    /// Step one snapshot toward the present.
    HistoryForward,
    /// Leave navigation and restore the live grid.
    HistoryResume,
}

impl Input {
    pub fn name(self) -> &'static str {
        match self {
            Input::HistoryBack => "history_back",
            Input::HistoryForward => "history_forward",
            Input::HistoryResume => "history_resume",
        }
    }
}

/// One unit of work for the session consumer.
#[derive(Debug)]
pub enum Event {
    /// A wire command with its pending reply.
    Command(Envelope),
    /// A lifecycle transition.
    Control(Control),
    /// A direct input.
    Input(Input),
    /// One simulation tick elapsed.
    Tick,
}
