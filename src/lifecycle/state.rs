//! Atomic lifecycle state for receivers.
//!
//! # Design Decisions
//! - Transitions are compare-and-swap, so a late callback observes either
//!   `Started` or `Stopped`, never a half-updated flag
//! - `Stopped` is terminal: a receiver is not restartable

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, not yet listening.
    Created,
    /// Listening and dispatching messages.
    Started,
    /// Stopped; resources released or being released.
    Stopped,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Created,
            1 => LifecycleState::Started,
            _ => LifecycleState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            LifecycleState::Created => 0,
            LifecycleState::Started => 1,
            LifecycleState::Stopped => 2,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "created"),
            LifecycleState::Started => write!(f, "started"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Shared, lock-free lifecycle cell.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created.as_u8()),
        }
    }

    pub fn current(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_started(&self) -> bool {
        self.current() == LifecycleState::Started
    }

    /// Move `Created → Started`. On failure returns the state that blocked it.
    pub fn try_start(&self) -> Result<(), LifecycleState> {
        self.state
            .compare_exchange(
                LifecycleState::Created.as_u8(),
                LifecycleState::Started.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(LifecycleState::from_u8)
    }

    /// Move to `Stopped`, returning the previous state.
    pub fn stop(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.swap(LifecycleState::Stopped.as_u8(), Ordering::AcqRel))
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_once() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.current(), LifecycleState::Created);
        assert_eq!(lifecycle.try_start(), Ok(()));
        assert!(lifecycle.is_started());
        assert_eq!(lifecycle.try_start(), Err(LifecycleState::Started));
    }

    #[test]
    fn stop_is_terminal_and_idempotent() {
        let lifecycle = Lifecycle::new();
        lifecycle.try_start().unwrap();
        assert_eq!(lifecycle.stop(), LifecycleState::Started);
        assert_eq!(lifecycle.stop(), LifecycleState::Stopped);
        assert_eq!(lifecycle.try_start(), Err(LifecycleState::Stopped));
        assert!(!lifecycle.is_started());
    }

    #[test]
    fn stop_before_start() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.stop(), LifecycleState::Created);
        assert_eq!(lifecycle.current(), LifecycleState::Stopped);
    }
}
