use std::sync::Arc;

use client_core::{
    is_simulation_eligible, ActionOutcome, CallLifecycleController, OperatorRole, Screen,
};
use tokio::time::Instant;
use tracing::info;

use crate::{
    commands::{Command, HELP},
    console::describe,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One operator's console: owns the single controller and the call clock.
pub struct AgentSession {
    controller: Arc<CallLifecycleController>,
    role: OperatorRole,
    screen: Screen,
    answered_at: Option<Instant>,
}

impl AgentSession {
    pub async fn open(
        controller: Arc<CallLifecycleController>,
        role: OperatorRole,
        screen: Screen,
    ) -> Self {
        controller
            .set_enabled(is_simulation_eligible(role, screen))
            .await;
        controller.start().await;
        Self {
            controller,
            role,
            screen,
            answered_at: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub async fn navigate(&mut self, screen: Screen) {
        self.screen = screen;
        let eligible = is_simulation_eligible(self.role, screen);
        info!(?screen, eligible, "navigated");
        self.controller.set_enabled(eligible).await;
    }

    pub async fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Accept => {
                let outcome = self.controller.accept_call().await;
                if outcome == ActionOutcome::Applied {
                    self.answered_at = Some(Instant::now());
                }
                report(outcome);
            }
            Command::Decline => report(self.controller.decline_call().await),
            Command::Finalize => {
                let elapsed = self
                    .answered_at
                    .map(|answered| answered.elapsed().as_secs())
                    .unwrap_or_default();
                let outcome = self.controller.finalize_call(elapsed).await;
                if outcome == ActionOutcome::Applied {
                    self.answered_at = None;
                }
                report(outcome);
            }
            Command::Ticket(ticket_id) => {
                report(self.controller.associate_ticket(ticket_id).await)
            }
            Command::Goto(screen) => self.navigate(screen).await,
            Command::Ring => self.controller.trigger_incoming_call().await,
            Command::Status => println!("{}", describe(&self.controller.snapshot().await)),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}

fn report(outcome: ActionOutcome) {
    match outcome {
        ActionOutcome::Applied | ActionOutcome::RegistryFailed => {}
        ActionOutcome::NoCurrentCall => println!("there is no call right now"),
        ActionOutcome::WrongPhase => println!("that action does not apply to this call"),
        ActionOutcome::Busy => println!("still waiting for the previous action"),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
