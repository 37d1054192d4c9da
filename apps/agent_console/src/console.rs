use std::sync::Arc;

use client_core::{
    format_duration, CallLifecycleController, CallPhase, CallResolution, ControllerEvent,
    ControllerSnapshot, LifecycleState, NotificationLevel, Notifier,
};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::debug;

/// Prints notifications the way a toast would show them.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, level: NotificationLevel) {
        let tag = match level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warn",
        };
        println!("[{tag}] {message}");
    }
}

pub fn render_event(event: &ControllerEvent) -> Option<String> {
    match event {
        ControllerEvent::CallRinging(call) => Some(format!(
            "*** incoming call #{} from {} (accept / decline) ***",
            call.call_id, call.origin_number
        )),
        ControllerEvent::CallAnswered { .. } => Some("(ringing stopped)".to_string()),
        ControllerEvent::CallResolved {
            call_id,
            resolution: CallResolution::Finalized { duration_seconds },
        } => Some(format!(
            "call #{call_id} closed after {}",
            format_duration(*duration_seconds)
        )),
        ControllerEvent::CallResolved { .. }
        | ControllerEvent::CallScheduled { .. }
        | ControllerEvent::SchedulingCancelled => None,
    }
}

pub fn describe(snapshot: &ControllerSnapshot) -> String {
    let simulation = if snapshot.enabled { "on" } else { "off" };
    match (&snapshot.state, &snapshot.current) {
        (LifecycleState::Ringing | LifecycleState::Active, Some(call)) => {
            let phase = match call.phase {
                CallPhase::Ringing => "ringing",
                CallPhase::Active => "in progress",
            };
            format!(
                "call #{} from {} is {phase} (simulation {simulation})",
                call.call_id, call.origin_number
            )
        }
        (LifecycleState::Scheduled, _) => {
            format!("waiting for the next call (simulation {simulation})")
        }
        _ => format!("no call (simulation {simulation})"),
    }
}

pub fn spawn_event_printer(controller: &Arc<CallLifecycleController>) -> JoinHandle<()> {
    let mut events = controller.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "controller event");
                    if let Some(line) = render_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}
