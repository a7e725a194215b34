//! Host idle state
//!
//! The host reports transitions between these states. Only a transition to
//! `Idle` triggers suspension; `Locked` is reported separately by some hosts
//! and is left alone.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    /// User is interacting with the machine
    Active,
    /// No input for the host's idle interval
    Idle,
    /// Screen is locked
    Locked,
}

impl IdleState {
    /// Returns true if background tabs should be suspended
    pub fn should_suspend(&self) -> bool {
        matches!(self, IdleState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdleState::Active => "active",
            IdleState::Idle => "idle",
            IdleState::Locked => "locked",
        }
    }
}

impl std::fmt::Display for IdleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IdleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(IdleState::Active),
            "idle" => Ok(IdleState::Idle),
            "locked" => Ok(IdleState::Locked),
            _ => Err(format!("Unknown idle state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_idle_suspends() {
        assert!(IdleState::Idle.should_suspend());
        assert!(!IdleState::Active.should_suspend());
        assert!(!IdleState::Locked.should_suspend());
    }

    #[test]
    fn test_parse() {
        assert_eq!("idle".parse::<IdleState>(), Ok(IdleState::Idle));
        assert_eq!("ACTIVE".parse::<IdleState>(), Ok(IdleState::Active));
        assert_eq!("locked".parse::<IdleState>(), Ok(IdleState::Locked));
        assert!("asleep".parse::<IdleState>().is_err());
    }
}
