use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorRole {
    FrontLineAgent,
    Supervisor,
    ExternalArea,
    Administrator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    CallHandling,
    Tickets,
    Dashboard,
    Surveys,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for OperatorRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" | "front-line-agent" => Ok(OperatorRole::FrontLineAgent),
            "supervisor" => Ok(OperatorRole::Supervisor),
            "external-area" | "external" => Ok(OperatorRole::ExternalArea),
            "admin" | "administrator" => Ok(OperatorRole::Administrator),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Screen {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calls" | "call-handling" => Ok(Screen::CallHandling),
            "tickets" => Ok(Screen::Tickets),
            "dashboard" => Ok(Screen::Dashboard),
            "surveys" => Ok(Screen::Surveys),
            _ => Err(UnknownVariant {
                kind: "screen",
                value: s.to_string(),
            }),
        }
    }
}

/// Simulated calls only run for a front-line agent sitting on the call screen.
pub fn is_simulation_eligible(role: OperatorRole, screen: Screen) -> bool {
    role == OperatorRole::FrontLineAgent && screen == Screen::CallHandling
}
