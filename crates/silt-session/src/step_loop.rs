//! Synchronous session driver.
//!
//! [`StepLoop`] is the threadless counterpart of
//! [`SessionWorld`](crate::SessionWorld): events are queued on the
//! caller's thread and [`pump`](StepLoop::pump) processes them to
//! completion. Used by tests and by embeddings that drive their own
//! main loop and call [`tick`](StepLoop::tick) at their own cadence.

use std::collections::VecDeque;

use crossbeam_channel::Receiver;

use silt_core::{Command, Grid, Reply};
use silt_physics::PhysicsConfig;

use crate::config::{SessionConfig, SessionConfigError};
use crate::envelope::Envelope;
use crate::event::{Control, Event, Input};
use crate::machine::{SessionMachine, SessionState};

/// Single-threaded session embedding.
pub struct StepLoop {
    machine: SessionMachine,
    queue: VecDeque<Event>,
}

impl StepLoop {
    pub fn new(
        config: SessionConfig,
        initial: Grid,
        physics: PhysicsConfig,
    ) -> Result<Self, SessionConfigError> {
        Ok(Self {
            machine: SessionMachine::new(config, initial, physics)?,
            queue: VecDeque::new(),
        })
    }

    /// Queue a command; the reply arrives on the returned channel once
    /// [`pump`](Self::pump) has processed it.
    pub fn submit(&mut self, command: Command) -> Receiver<Reply> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.queue
            .push_back(Event::Command(Envelope::new(command, reply_tx)));
        reply_rx
    }

    pub fn control(&mut self, control: Control) {
        self.queue.push_back(Event::Control(control));
    }

    pub fn input(&mut self, input: Input) {
        self.queue.push_back(Event::Input(input));
    }

    /// Queue one simulation tick.
    pub fn tick(&mut self) {
        self.queue.push_back(Event::Tick);
    }

    /// Process every queued event in order. Returns the number handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.pop_front() {
            self.machine.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn state(&self) -> &SessionState {
        self.machine.state()
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::{Material, Okay};

    #[test]
    fn pump_processes_queued_events_in_order() {
        let mut sl = StepLoop::new(
            SessionConfig::default(),
            Grid::new(4, 4).unwrap(),
            PhysicsConfig::default(),
        )
        .unwrap();

        sl.control(Control::Connect);
        sl.control(Control::StartSim);
        let set_rx = sl.submit(Command::CellSet {
            x: 1,
            y: 2,
            material: Material::Dirt,
            fill: 0.6,
        });
        let get_rx = sl.submit(Command::CellGet { x: 1, y: 2 });

        assert_eq!(sl.pump(), 4);
        assert_eq!(set_rx.try_recv().unwrap(), Ok(Okay::Ack));
        match get_rx.try_recv().unwrap() {
            Ok(Okay::Cell(cell)) => assert_eq!(cell.material, Material::Dirt),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn ticks_advance_time_deterministically() {
        let mut sl = StepLoop::new(
            SessionConfig::default(),
            Grid::new(4, 4).unwrap(),
            PhysicsConfig::default(),
        )
        .unwrap();
        sl.control(Control::Connect);
        sl.control(Control::StartSim);
        for _ in 0..7 {
            sl.tick();
        }
        sl.pump();

        let sim = sl.machine().sim().unwrap();
        assert_eq!(sim.grid().step().0, 7);
    }

    #[test]
    fn pump_on_empty_queue_is_a_noop() {
        let mut sl = StepLoop::new(
            SessionConfig::default(),
            Grid::new(4, 4).unwrap(),
            PhysicsConfig::default(),
        )
        .unwrap();
        assert_eq!(sl.pump(), 0);
    }
}
