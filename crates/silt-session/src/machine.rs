//! The session finite state machine.
//!
//! One value of [`SessionMachine`] exclusively owns the live grid and
//! its history; everything else talks to it through [`Event`]s. Each
//! handler is a pure function of (state, event): it produces the next
//! state, resolves at most one reply, and never blocks.
//!
//! Command legality by state:
//!
//! | State        | Accepts                                              |
//! |--------------|------------------------------------------------------|
//! | Disconnected | connect, exit                                        |
//! | StartMenu    | start, exit, connection-lost                         |
//! | Paused       | CellGet/CellSet/GravitySet/StateGet/Reset, inputs,   |
//! |              | resume, exit, connection-lost                        |
//! | SimRunning   | all Paused commands plus StepN, pause                |
//! | Shutdown     | none (terminal)                                      |
//!
//! Illegal commands resolve immediately with an [`ApiError`] and cause
//! no transition.

use silt_core::{ApiError, Command, Grid, GridSnapshot, Okay, Reply};
use silt_history::HistoryManager;
use silt_physics::{step, PhysicsConfig};

use crate::config::{SessionConfig, SessionConfigError};
use crate::envelope::Envelope;
use crate::event::{Control, Event, Input};

/// The simulation a connected session owns: the live grid, its history,
/// and the reset template.
#[derive(Debug)]
pub struct Sim {
    grid: Grid,
    history: HistoryManager,
    initial: Grid,
}

impl Sim {
    fn new(initial: Grid) -> Self {
        Self {
            grid: initial.clone(),
            history: HistoryManager::new(),
            initial,
        }
    }

    /// The live grid. Reads that must respect history navigation go
    /// through [`viewed`](Self::viewed) instead.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// The grid reads are currently served from.
    pub fn viewed(&self) -> &Grid {
        self.history.viewed(&self.grid)
    }
}

/// Session lifecycle states. Transitions move the owned [`Sim`].
#[derive(Debug)]
pub enum SessionState {
    /// No client; the only state that cannot see a grid.
    Disconnected,
    /// Connected, no simulation yet.
    StartMenu,
    /// Owns a simulation but does not advance time.
    Paused(Sim),
    /// Advances time one step per tick.
    SimRunning(Sim),
    /// Terminal.
    Shutdown,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::StartMenu => "start_menu",
            SessionState::Paused(_) => "paused",
            SessionState::SimRunning(_) => "sim_running",
            SessionState::Shutdown => "shutdown",
        }
    }
}

/// Event-driven session core. Single-owner: the caller (a consumer
/// thread or a synchronous loop) feeds it one event at a time.
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    config: SessionConfig,
    initial: Grid,
    physics: PhysicsConfig,
}

impl SessionMachine {
    /// Create a machine in `Disconnected`, holding the grid template
    /// new simulations start from. Both configurations are validated;
    /// a degenerate physics config is rejected here rather than left to
    /// misbehave mid-step.
    pub fn new(
        config: SessionConfig,
        initial: Grid,
        physics: PhysicsConfig,
    ) -> Result<Self, SessionConfigError> {
        config.validate()?;
        physics.validate()?;
        Ok(Self {
            state: SessionState::Disconnected,
            config,
            initial,
            physics,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self.state, SessionState::Shutdown)
    }

    /// The simulation owned by the current state, if any.
    pub fn sim(&self) -> Option<&Sim> {
        match &self.state {
            SessionState::Paused(sim) | SessionState::SimRunning(sim) => Some(sim),
            _ => None,
        }
    }

    /// Process one event to completion. Commands are resolved exactly
    /// once before this returns.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Command(envelope) => self.handle_command(envelope),
            Event::Control(control) => self.handle_control(control),
            Event::Input(input) => self.handle_input(input),
            Event::Tick => self.handle_tick(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    fn handle_command(&mut self, envelope: Envelope) {
        let reply = match &mut self.state {
            SessionState::Disconnected => Err(ApiError::new("not connected")),
            SessionState::StartMenu => Err(ApiError::new("no simulation running")),
            SessionState::Paused(sim) => {
                Self::apply_command(sim, &self.config, &self.physics, envelope.command(), false)
            }
            SessionState::SimRunning(sim) => {
                Self::apply_command(sim, &self.config, &self.physics, envelope.command(), true)
            }
            SessionState::Shutdown => Err(ApiError::new("session shut down")),
        };
        if let Err(e) = &reply {
            log::debug!(
                "command {} rejected in {}: {e}",
                envelope.command().name(),
                self.state.name()
            );
        }
        envelope.resolve(reply);
    }

    fn apply_command(
        sim: &mut Sim,
        config: &SessionConfig,
        physics: &PhysicsConfig,
        command: &Command,
        running: bool,
    ) -> Reply {
        match *command {
            Command::CellGet { x, y } => match sim.viewed().cell(x, y) {
                Some(cell) => Ok(Okay::Cell(*cell)),
                None => Err(ApiError::new(format!("cell ({x}, {y}) out of bounds"))),
            },
            Command::CellSet {
                x,
                y,
                material,
                fill,
            } => {
                if sim.history.is_navigating() {
                    return Err(ApiError::new("cannot mutate while navigating history"));
                }
                sim.grid
                    .set_cell(x, y, material, fill)
                    .map_err(|e| ApiError::new(e.to_string()))?;
                sim.history.mark_dirty();
                Ok(Okay::Ack)
            }
            Command::GravitySet { gravity } => {
                if sim.history.is_navigating() {
                    return Err(ApiError::new("cannot mutate while navigating history"));
                }
                sim.grid
                    .set_gravity(gravity)
                    .map_err(|e| ApiError::new(e.to_string()))?;
                sim.history.mark_dirty();
                Ok(Okay::Ack)
            }
            Command::Reset => {
                // History leaves navigation first; a reset applied to the
                // live grid while the cursor still pointed into the buffer
                // would be shadowed by the next read.
                sim.history.reset_to_initial();
                sim.grid = sim.initial.clone();
                Ok(Okay::Ack)
            }
            Command::StateGet => Ok(Okay::State(GridSnapshot::from(sim.viewed()))),
            Command::StepN { frames } => {
                if !running {
                    return Err(ApiError::new("step is only legal while running"));
                }
                for _ in 0..frames {
                    Self::advance(sim, config, physics);
                }
                Ok(Okay::Stepped(sim.grid.step()))
            }
        }
    }

    /// One simulation step plus snapshot bookkeeping.
    fn advance(sim: &mut Sim, config: &SessionConfig, physics: &PhysicsConfig) {
        sim.grid = step(&sim.grid, physics);
        sim.history.mark_dirty();
        if sim.grid.step().0 % config.snapshot_interval == 0 {
            sim.history.record_if_dirty(&sim.grid);
        }
    }

    // ── Controls ─────────────────────────────────────────────────────

    fn handle_control(&mut self, control: Control) {
        let from = self.state.name();
        // Placeholder while the Sim moves between variants.
        let state = std::mem::replace(&mut self.state, SessionState::Shutdown);
        self.state = match (state, control) {
            (SessionState::Disconnected, Control::Connect) => SessionState::StartMenu,
            (SessionState::StartMenu, Control::StartSim) => {
                SessionState::SimRunning(Sim::new(self.initial.clone()))
            }
            (SessionState::SimRunning(sim), Control::Pause) => SessionState::Paused(sim),
            (SessionState::Paused(mut sim), Control::Resume) => {
                // Running never navigates; leave replay viewing first.
                if sim.history.is_navigating() {
                    sim.grid = sim
                        .history
                        .resume_live()
                        .expect("navigating implies resume_live succeeds");
                }
                SessionState::SimRunning(sim)
            }
            (_, Control::Exit) => SessionState::Shutdown,
            (
                SessionState::StartMenu | SessionState::Paused(_) | SessionState::SimRunning(_),
                Control::ConnectionLost,
            ) => SessionState::Disconnected,
            (state, control) => {
                log::warn!("control {} ignored in {}", control.name(), state.name());
                state
            }
        };
        if self.state.name() != from {
            log::info!("session: {from} -> {}", self.state.name());
        }
    }

    // ── Inputs ───────────────────────────────────────────────────────

    fn handle_input(&mut self, input: Input) {
        let SessionState::Paused(sim) = &mut self.state else {
            log::debug!("input {} ignored in {}", input.name(), self.state.name());
            return;
        };
        match input {
            Input::HistoryBack => {
                if sim.history.is_navigating() {
                    let _ = sim.history.navigate(-1);
                } else if let Err(e) = sim.history.begin_navigation(&sim.grid) {
                    log::warn!("begin_navigation failed: {e}");
                }
            }
            Input::HistoryForward => {
                if sim.history.is_navigating() {
                    let _ = sim.history.navigate(1);
                }
            }
            Input::HistoryResume => {
                if sim.history.is_navigating() {
                    sim.grid = sim
                        .history
                        .resume_live()
                        .expect("navigating implies resume_live succeeds");
                }
            }
        }
    }

    // ── Ticks ────────────────────────────────────────────────────────

    fn handle_tick(&mut self) {
        if let SessionState::SimRunning(sim) = &mut self.state {
            Self::advance(sim, &self.config, &self.physics);
        }
    }
}
