//! Application state machine shared between the shell and the core services.
//!
//! The machine holds a single current state plus the last error message. Both
//! are replaced wholesale on every transition and no history is kept. By
//! default any state may follow any other; strict mode enforces the table in
//! [`AppState::can_transition_to`].

use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Coarse application lifecycle state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    #[default]
    Idle,
    Configured,
    PairsLoaded,
    AiReady,
    Running,
    Stopped,
    Error,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Configured => "CONFIGURED",
            Self::PairsLoaded => "PAIRS_LOADED",
            Self::AiReady => "AI_READY",
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Error => "ERROR",
        }
    }

    /// Transition table used in strict mode.
    ///
    /// `Error` is reachable from anywhere and can recover to anything, as can
    /// `Stopped`. Staying in the same state and resetting to `Idle` are always
    /// allowed.
    pub fn can_transition_to(&self, next: AppState) -> bool {
        use AppState::*;

        if *self == next || matches!(next, Error | Idle) || matches!(self, Error | Stopped) {
            return true;
        }

        matches!(
            (self, next),
            (Idle, Configured)
                | (Idle, AiReady)
                | (Configured, PairsLoaded)
                | (Configured, AiReady)
                | (PairsLoaded, Configured)
                | (PairsLoaded, AiReady)
                | (AiReady, PairsLoaded)
                | (AiReady, Running)
                | (Running, Stopped)
        )
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus the error attached to it, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub state: AppState,
    pub last_error: Option<String>,
}

/// Callback invoked after every accepted transition.
pub type TransitionListener = Box<dyn Fn(&StateSnapshot) + Send + Sync>;

/// Shared, overwrite-only state holder.
///
/// Services receive an `Arc<StateMachine>` at construction time instead of
/// reaching for a global.
pub struct StateMachine {
    current: RwLock<StateSnapshot>,
    listeners: RwLock<Vec<TransitionListener>>,
    strict: bool,
}

impl StateMachine {
    /// Permissive machine starting in `Idle`.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(StateSnapshot::default()),
            listeners: RwLock::new(Vec::new()),
            strict: false,
        }
    }

    /// Machine that rejects transitions outside [`AppState::can_transition_to`].
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::new()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    fn read(&self) -> RwLockReadGuard<'_, StateSnapshot> {
        self.current.read().unwrap_or_else(|poisoned| {
            warn!("State machine lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, StateSnapshot> {
        self.current.write().unwrap_or_else(|poisoned| {
            warn!("State machine lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Replace the current state and error.
    ///
    /// Only fails in strict mode, for a transition outside the table.
    pub fn set_state(&self, new_state: AppState, error: Option<String>) -> Result<()> {
        let snapshot = {
            let mut current = self.write();
            if self.strict && !current.state.can_transition_to(new_state) {
                return Err(Error::IllegalTransition {
                    from: current.state,
                    to: new_state,
                });
            }
            debug!("State {} -> {}", current.state, new_state);
            *current = StateSnapshot {
                state: new_state,
                last_error: error,
            };
            current.clone()
        };

        let listeners = self.listeners.read().unwrap_or_else(|p| p.into_inner());
        for listener in listeners.iter() {
            listener(&snapshot);
        }
        Ok(())
    }

    /// Shorthand for `set_state(AppState::Error, Some(message))`.
    pub fn fail(&self, message: impl Into<String>) {
        // Error is reachable from every state, even in strict mode.
        let _ = self.set_state(AppState::Error, Some(message.into()));
    }

    pub fn state(&self) -> AppState {
        self.read().state
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state() == AppState::Running
    }

    /// Register a callback for every accepted transition.
    pub fn subscribe(&self, listener: TransitionListener) {
        self.listeners
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(listener);
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &*self.read())
            .field("strict", &self.strict)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_starts_idle_without_error() {
        let machine = StateMachine::new();
        assert_eq!(machine.state(), AppState::Idle);
        assert!(machine.last_error().is_none());
        assert!(!machine.is_running());
    }

    #[test]
    fn test_set_state_overwrites_error() {
        let machine = StateMachine::new();
        machine.fail("boom");
        assert_eq!(machine.state(), AppState::Error);
        assert_eq!(machine.last_error().as_deref(), Some("boom"));

        machine.set_state(AppState::AiReady, None).unwrap();
        assert_eq!(machine.state(), AppState::AiReady);
        assert!(machine.last_error().is_none());
    }

    #[test]
    fn test_permissive_mode_accepts_any_transition() {
        let machine = StateMachine::new();
        machine.set_state(AppState::Running, None).unwrap();
        assert!(machine.is_running());
        machine.set_state(AppState::Configured, None).unwrap();
        machine.set_state(AppState::Stopped, None).unwrap();
        machine.set_state(AppState::PairsLoaded, None).unwrap();
        assert_eq!(machine.state(), AppState::PairsLoaded);
    }

    #[test]
    fn test_strict_mode_rejects_skipping_ahead() {
        let machine = StateMachine::strict();
        let err = machine.set_state(AppState::Running, None).unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalTransition {
                from: AppState::Idle,
                to: AppState::Running
            }
        ));
        assert_eq!(machine.state(), AppState::Idle);

        machine.set_state(AppState::Configured, None).unwrap();
        machine.set_state(AppState::PairsLoaded, None).unwrap();
        machine.set_state(AppState::AiReady, None).unwrap();
        machine.set_state(AppState::Running, None).unwrap();
        machine.set_state(AppState::Stopped, None).unwrap();
    }

    #[test]
    fn test_strict_mode_allows_ai_ready_from_idle() {
        let machine = StateMachine::strict();
        machine.set_state(AppState::AiReady, None).unwrap();
        assert_eq!(machine.state(), AppState::AiReady);
        assert!(!AppState::Idle.can_transition_to(AppState::PairsLoaded));
    }

    #[test]
    fn test_strict_mode_error_always_reachable() {
        let machine = StateMachine::strict();
        machine.fail("network down");
        assert_eq!(machine.state(), AppState::Error);
        // Recovery from Error may go anywhere.
        machine.set_state(AppState::AiReady, None).unwrap();
    }

    #[test]
    fn test_listeners_see_every_transition() {
        let machine = StateMachine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        machine.subscribe(Box::new(move |snap| {
            sink.lock().unwrap().push(snap.clone());
        }));

        machine.set_state(AppState::Configured, None).unwrap();
        machine.fail("bad json");
        machine.fail("bad json again");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].state, AppState::Error);
        assert_eq!(seen[2].last_error.as_deref(), Some("bad json again"));
    }

    #[test]
    fn test_state_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&AppState::PairsLoaded).unwrap();
        assert_eq!(json, "\"PAIRS_LOADED\"");
    }
}
