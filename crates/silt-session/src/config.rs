//! Session configuration and validation.

use std::error::Error;
use std::fmt;

use silt_physics::PhysicsConfigError;

/// Tunables for the session event loop.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Capacity of the bounded event queue between producers and the
    /// consumer thread.
    pub queue_capacity: usize,
    /// Tick rate while the simulation is running.
    pub tick_rate_hz: f64,
    /// A history snapshot is recorded every this many steps of live
    /// simulation.
    pub snapshot_interval: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            tick_rate_hz: 60.0,
            snapshot_interval: 16,
        }
    }
}

impl SessionConfig {
    /// Check every field; errors name the offending value.
    pub fn validate(&self) -> Result<(), SessionConfigError> {
        if self.queue_capacity == 0 {
            return Err(SessionConfigError::ZeroQueueCapacity);
        }
        if !self.tick_rate_hz.is_finite() || self.tick_rate_hz <= 0.0 {
            return Err(SessionConfigError::InvalidTickRate {
                value: self.tick_rate_hz,
            });
        }
        if self.snapshot_interval == 0 {
            return Err(SessionConfigError::ZeroSnapshotInterval);
        }
        Ok(())
    }
}

/// Invalid configuration handed to the session at construction.
#[derive(Debug, PartialEq)]
pub enum SessionConfigError {
    ZeroQueueCapacity,
    InvalidTickRate { value: f64 },
    ZeroSnapshotInterval,
    /// The physics configuration failed its own validation.
    InvalidPhysics(PhysicsConfigError),
}

impl fmt::Display for SessionConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroQueueCapacity => write!(f, "queue capacity must be at least 1"),
            Self::InvalidTickRate { value } => {
                write!(f, "tick rate must be finite and positive, got {value}")
            }
            Self::ZeroSnapshotInterval => write!(f, "snapshot interval must be at least 1"),
            Self::InvalidPhysics(e) => write!(f, "physics config: {e}"),
        }
    }
}

impl Error for SessionConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPhysics(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PhysicsConfigError> for SessionConfigError {
    fn from(e: PhysicsConfigError) -> Self {
        Self::InvalidPhysics(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let cfg = SessionConfig {
            queue_capacity: 0,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.validate(), Err(SessionConfigError::ZeroQueueCapacity));
    }

    #[test]
    fn non_positive_tick_rate_is_rejected() {
        for bad in [0.0, -60.0, f64::NAN, f64::INFINITY] {
            let cfg = SessionConfig {
                tick_rate_hz: bad,
                ..SessionConfig::default()
            };
            assert!(cfg.validate().is_err(), "tick rate {bad} should fail");
        }
    }

    #[test]
    fn zero_snapshot_interval_is_rejected() {
        let cfg = SessionConfig {
            snapshot_interval: 0,
            ..SessionConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(SessionConfigError::ZeroSnapshotInterval)
        );
    }
}
