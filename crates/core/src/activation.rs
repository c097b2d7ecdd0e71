//! Activation state machine gating polling and simulation.
//!
//! ```text
//! Idle ──activate──▶ Activating ──ok──▶ Active ──deactivate──▶ Stopping ──▶ Idle
//!   ▲                    │
//!   │                    └──err──▶ Error ──retry──▶ Activating
//!   └──────dismiss──────────────────┘
//! ```
//!
//! Invalid calls are ignored rather than rejected, so callers can fire them
//! from UI actions without guarding.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    #[default]
    Idle,
    Activating,
    Active,
    Stopping,
    Error,
}

impl ActivationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationState::Idle => "idle",
            ActivationState::Activating => "activating",
            ActivationState::Active => "active",
            ActivationState::Stopping => "stopping",
            ActivationState::Error => "error",
        }
    }
}

impl core::fmt::Display for ActivationState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that the caller owns the pending activation.
///
/// Only the holder of the current ticket can complete it; a ticket from an
/// earlier run is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationTicket {
    attempt: u64,
}

impl ActivationTicket {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

/// Result of asking the machine for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The machine moved from `from` to `to`.
    Applied {
        from: ActivationState,
        to: ActivationState,
    },
    /// The call was not valid in `state` and changed nothing.
    Ignored { state: ActivationState },
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationMachine {
    state: ActivationState,
    failure: Option<String>,
    attempt: u64,
    epoch: u64,
}

impl ActivationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Reason recorded by the last failed activation, if still in `Error`.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Run epoch. Bumped whenever a run is torn down (deactivation or
    /// invalidation), so work begun under an older epoch knows to drop its
    /// result.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_active(&self) -> bool {
        self.state == ActivationState::Active
    }

    /// `Idle | Error → Activating`. `None` for any other state.
    pub fn begin_activation(&mut self) -> Option<ActivationTicket> {
        match self.state {
            ActivationState::Idle | ActivationState::Error => {
                self.state = ActivationState::Activating;
                self.failure = None;
                self.attempt += 1;
                Some(ActivationTicket {
                    attempt: self.attempt,
                })
            }
            _ => None,
        }
    }

    /// `Activating → Active`, if `ticket` is still current.
    pub fn complete_activation(&mut self, ticket: ActivationTicket) -> Transition {
        self.finish(ticket, ActivationState::Active, None)
    }

    /// `Activating → Error`, if `ticket` is still current.
    pub fn fail_activation(&mut self, ticket: ActivationTicket, reason: impl Into<String>) -> Transition {
        self.finish(ticket, ActivationState::Error, Some(reason.into()))
    }

    fn finish(
        &mut self,
        ticket: ActivationTicket,
        to: ActivationState,
        failure: Option<String>,
    ) -> Transition {
        if self.state != ActivationState::Activating || ticket.attempt != self.attempt {
            return Transition::Ignored { state: self.state };
        }
        let from = self.state;
        self.state = to;
        self.failure = failure;
        Transition::Applied { from, to }
    }

    /// `Active → Stopping`. Bumps the epoch so in-flight work is discarded.
    pub fn begin_deactivation(&mut self) -> Transition {
        if self.state != ActivationState::Active {
            return Transition::Ignored { state: self.state };
        }
        self.state = ActivationState::Stopping;
        self.epoch += 1;
        Transition::Applied {
            from: ActivationState::Active,
            to: ActivationState::Stopping,
        }
    }

    /// `Stopping → Idle`.
    pub fn finish_deactivation(&mut self) -> Transition {
        if self.state != ActivationState::Stopping {
            return Transition::Ignored { state: self.state };
        }
        self.state = ActivationState::Idle;
        Transition::Applied {
            from: ActivationState::Stopping,
            to: ActivationState::Idle,
        }
    }

    /// `Error → Idle`, clearing the recorded failure.
    pub fn dismiss(&mut self) -> Transition {
        if self.state != ActivationState::Error {
            return Transition::Ignored { state: self.state };
        }
        self.state = ActivationState::Idle;
        self.failure = None;
        Transition::Applied {
            from: ActivationState::Error,
            to: ActivationState::Idle,
        }
    }

    /// Invalidate any in-flight work without changing state (used on unmount).
    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_cycle() {
        let mut m = ActivationMachine::new();
        assert_eq!(m.state(), ActivationState::Idle);

        let ticket = m.begin_activation().unwrap();
        assert_eq!(m.state(), ActivationState::Activating);
        assert!(m.complete_activation(ticket).is_applied());
        assert!(m.is_active());

        assert!(m.begin_deactivation().is_applied());
        assert_eq!(m.state(), ActivationState::Stopping);
        assert!(m.finish_deactivation().is_applied());
        assert_eq!(m.state(), ActivationState::Idle);
    }

    #[test]
    fn reentrant_activation_is_refused() {
        let mut m = ActivationMachine::new();
        let _ticket = m.begin_activation().unwrap();
        assert!(m.begin_activation().is_none());
        assert_eq!(m.state(), ActivationState::Activating);
    }

    #[test]
    fn activation_from_active_is_refused() {
        let mut m = ActivationMachine::new();
        let ticket = m.begin_activation().unwrap();
        m.complete_activation(ticket);
        assert!(m.begin_activation().is_none());
        assert!(m.is_active());
    }

    #[test]
    fn failure_records_reason_and_allows_retry() {
        let mut m = ActivationMachine::new();
        let ticket = m.begin_activation().unwrap();
        m.fail_activation(ticket, "backend rejected activation");
        assert_eq!(m.state(), ActivationState::Error);
        assert_eq!(m.failure(), Some("backend rejected activation"));

        let retry = m.begin_activation().unwrap();
        assert_eq!(m.failure(), None);
        assert!(m.complete_activation(retry).is_applied());
    }

    #[test]
    fn dismiss_returns_to_idle() {
        let mut m = ActivationMachine::new();
        let ticket = m.begin_activation().unwrap();
        m.fail_activation(ticket, "boom");
        assert!(m.dismiss().is_applied());
        assert_eq!(m.state(), ActivationState::Idle);
        assert_eq!(m.failure(), None);
        assert_eq!(
            m.dismiss(),
            Transition::Ignored {
                state: ActivationState::Idle
            }
        );
    }

    #[test]
    fn deactivate_from_idle_is_ignored() {
        let mut m = ActivationMachine::new();
        assert_eq!(
            m.begin_deactivation(),
            Transition::Ignored {
                state: ActivationState::Idle
            }
        );
        assert!(!m.finish_deactivation().is_applied());
    }

    #[test]
    fn stale_ticket_cannot_complete() {
        let mut m = ActivationMachine::new();
        let first = m.begin_activation().unwrap();
        m.fail_activation(first, "x");
        let _second = m.begin_activation().unwrap();

        assert!(!m.complete_activation(first).is_applied());
        assert_eq!(m.state(), ActivationState::Activating);
    }

    #[test]
    fn epoch_moves_only_on_teardown() {
        let mut m = ActivationMachine::new();
        let e0 = m.epoch();
        let ticket = m.begin_activation().unwrap();
        assert_eq!(m.epoch(), e0);
        m.complete_activation(ticket);
        m.begin_deactivation();
        assert_eq!(m.epoch(), e0 + 1);
        m.invalidate();
        assert_eq!(m.epoch(), e0 + 2);
    }

    #[test]
    fn attempts_are_numbered() {
        let mut m = ActivationMachine::new();
        let first = m.begin_activation().unwrap();
        m.fail_activation(first, "x");
        let second = m.begin_activation().unwrap();
        assert_eq!(second.attempt(), first.attempt() + 1);
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ActivationState::Activating).unwrap(),
            serde_json::json!("activating")
        );
        assert_eq!(ActivationState::Stopping.to_string(), "stopping");
    }
}
