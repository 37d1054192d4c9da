use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use shared::{
    domain::{CallId, CallStateChange, TicketId},
    protocol::CallRecord,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    config::SimulatorConfig,
    error::{ConfigError, RegistryOperation, RegistryOperationFailed},
    format::{format_duration, generate_origin_number},
    notifier::{NotificationLevel, Notifier},
    registry::CallRegistry,
    schedule::{duration_millis, DelayPolicy, ScheduledTimer},
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Local view of where the current call is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Ringing,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Scheduled,
    Ringing,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallView {
    pub call_id: CallId,
    pub origin_number: String,
    pub phase: CallPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub state: LifecycleState,
    pub enabled: bool,
    pub current: Option<CallView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallResolution {
    Declined,
    Finalized { duration_seconds: u64 },
}

/// Presentation-side signals. None of these drive transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    CallScheduled { delay: Duration },
    SchedulingCancelled,
    CallRinging(CallView),
    /// Lets the host stop any ringing cue.
    CallAnswered { call_id: CallId },
    CallResolved {
        call_id: CallId,
        resolution: CallResolution,
    },
}

/// What happened to a requested transition. Registry failures never escape as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    RegistryFailed,
    NoCurrentCall,
    WrongPhase,
    Busy,
}

struct CurrentCall {
    call_id: CallId,
    origin_number: String,
    phase: CallPhase,
}

impl CurrentCall {
    fn from_record(record: CallRecord) -> Self {
        Self {
            call_id: record.id,
            origin_number: record.origin_number,
            phase: CallPhase::Ringing,
        }
    }

    fn view(&self) -> CallView {
        CallView {
            call_id: self.call_id,
            origin_number: self.origin_number.clone(),
            phase: self.phase,
        }
    }
}

struct ControllerState {
    enabled: bool,
    first_delay_consumed: bool,
    current: Option<CurrentCall>,
    timer: Option<ScheduledTimer>,
    timer_generation: u64,
    creating: bool,
    action_in_flight: bool,
}

impl ControllerState {
    fn lifecycle(&self) -> LifecycleState {
        match &self.current {
            Some(call) if call.phase == CallPhase::Active => LifecycleState::Active,
            Some(_) => LifecycleState::Ringing,
            None if self.timer.is_some() || self.creating => LifecycleState::Scheduled,
            None => LifecycleState::Idle,
        }
    }
}

/// Runs one simulated inbound call at a time on behalf of a single operator.
///
/// The controller starts idle; [`start`](Self::start) or
/// [`set_enabled`](Self::set_enabled) schedules the first call. Each
/// operator-driven transition produces exactly one notification, and a
/// failed registry call leaves the local state exactly as it was so the host
/// can retry the same action.
pub struct CallLifecycleController {
    config: SimulatorConfig,
    delays: DelayPolicy,
    registry: Arc<dyn CallRegistry>,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl CallLifecycleController {
    pub fn new(
        config: SimulatorConfig,
        registry: Arc<dyn CallRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Arc::new(Self {
            delays: DelayPolicy::from_config(&config),
            inner: Mutex::new(ControllerState {
                enabled: config.enabled,
                first_delay_consumed: false,
                current: None,
                timer: None,
                timer_generation: 0,
                creating: false,
                action_in_flight: false,
            }),
            config,
            registry,
            notifier,
            events,
        }))
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let state = self.inner.lock().await;
        ControllerSnapshot {
            state: state.lifecycle(),
            enabled: state.enabled,
            current: state.current.as_ref().map(CurrentCall::view),
        }
    }

    /// Leaves IDLE by scheduling the first call, if enabled.
    pub async fn start(self: &Arc<Self>) {
        let mut state = self.inner.lock().await;
        self.schedule_next(&mut state);
    }

    pub async fn set_enabled(self: &Arc<Self>, enabled: bool) {
        let mut state = self.inner.lock().await;
        if state.enabled == enabled {
            return;
        }
        state.enabled = enabled;
        info!(operator_id = %self.config.operator_id, enabled, "call simulation toggled");

        if enabled {
            self.schedule_next(&mut state);
        } else if let Some(timer) = state.timer.take() {
            timer.cancel();
            debug!("pending call timer cancelled");
            let _ = self.events.send(ControllerEvent::SchedulingCancelled);
        }
    }

    /// Rings immediately instead of waiting for the pending timer.
    pub async fn trigger_incoming_call(self: &Arc<Self>) {
        {
            let mut state = self.inner.lock().await;
            if state.current.is_some() {
                debug!("incoming call trigger ignored; a call is already current");
                return;
            }
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
        }
        self.generate_call(None).await;
    }

    pub async fn accept_call(&self) -> ActionOutcome {
        let call_id = match self.begin_action(CallPhase::Ringing).await {
            Ok(call_id) => call_id,
            Err(outcome) => return outcome,
        };

        let result = self
            .registry
            .set_state(call_id, CallStateChange::Accepted)
            .await;

        let mut state = self.inner.lock().await;
        state.action_in_flight = false;
        match result {
            Ok(_) => {
                if let Some(current) = state.current.as_mut().filter(|c| c.call_id == call_id) {
                    current.phase = CallPhase::Active;
                }
                drop(state);
                info!(%call_id, "simulated call accepted");
                self.notifier
                    .notify("Call accepted", NotificationLevel::Success);
                let _ = self.events.send(ControllerEvent::CallAnswered { call_id });
                ActionOutcome::Applied
            }
            Err(source) => {
                drop(state);
                self.report_failure(
                    RegistryOperationFailed::new(RegistryOperation::Accept, source),
                    call_id,
                    "Could not accept the call; try again",
                );
                ActionOutcome::RegistryFailed
            }
        }
    }

    pub async fn decline_call(self: &Arc<Self>) -> ActionOutcome {
        let call_id = match self.begin_action(CallPhase::Ringing).await {
            Ok(call_id) => call_id,
            Err(outcome) => return outcome,
        };

        let result = self
            .registry
            .set_state(call_id, CallStateChange::Declined)
            .await;

        let mut state = self.inner.lock().await;
        state.action_in_flight = false;
        match result {
            Ok(_) => {
                self.resolve_locked(&mut state, call_id, CallResolution::Declined);
                drop(state);
                info!(%call_id, "simulated call declined");
                self.notifier.notify("Call declined", NotificationLevel::Info);
                ActionOutcome::Applied
            }
            Err(source) => {
                drop(state);
                self.report_failure(
                    RegistryOperationFailed::new(RegistryOperation::Decline, source),
                    call_id,
                    "Could not decline the call; try again",
                );
                ActionOutcome::RegistryFailed
            }
        }
    }

    /// Ends the active call. The host measures `duration_seconds`.
    pub async fn finalize_call(self: &Arc<Self>, duration_seconds: u64) -> ActionOutcome {
        let call_id = match self.begin_action(CallPhase::Active).await {
            Ok(call_id) => call_id,
            Err(outcome) => return outcome,
        };

        let result = self.registry.finalize(call_id, duration_seconds).await;

        let mut state = self.inner.lock().await;
        state.action_in_flight = false;
        match result {
            Ok(_) => {
                self.resolve_locked(
                    &mut state,
                    call_id,
                    CallResolution::Finalized { duration_seconds },
                );
                drop(state);
                let duration = format_duration(duration_seconds);
                info!(%call_id, duration_seconds, "simulated call finalized");
                self.notifier.notify(
                    &format!("Call finalized. Duration: {duration}"),
                    NotificationLevel::Success,
                );
                ActionOutcome::Applied
            }
            Err(source) => {
                drop(state);
                self.report_failure(
                    RegistryOperationFailed::new(RegistryOperation::Finalize, source),
                    call_id,
                    "Could not finalize the call; try again",
                );
                ActionOutcome::RegistryFailed
            }
        }
    }

    /// Best-effort link between the active call and a ticket the host created.
    pub async fn associate_ticket(&self, ticket_id: TicketId) -> ActionOutcome {
        let call_id = {
            let state = self.inner.lock().await;
            match &state.current {
                None => return ActionOutcome::NoCurrentCall,
                Some(call) if call.phase != CallPhase::Active => return ActionOutcome::WrongPhase,
                Some(call) => call.call_id,
            }
        };

        match self.registry.associate_ticket(call_id, ticket_id).await {
            Ok(_) => {
                info!(%call_id, %ticket_id, "ticket associated with call");
                self.notifier.notify(
                    &format!("Ticket #{ticket_id} linked to call #{call_id}"),
                    NotificationLevel::Success,
                );
                ActionOutcome::Applied
            }
            Err(source) => {
                let err = RegistryOperationFailed::new(RegistryOperation::AssociateTicket, source);
                warn!(%call_id, %ticket_id, error = %err, "ticket association failed");
                self.notifier.notify(
                    &format!("Ticket #{ticket_id} was saved but could not be linked to the call"),
                    NotificationLevel::Warning,
                );
                ActionOutcome::RegistryFailed
            }
        }
    }

    async fn begin_action(&self, required: CallPhase) -> Result<CallId, ActionOutcome> {
        let mut state = self.inner.lock().await;
        let Some(current) = &state.current else {
            debug!(?required, "transition requested without a current call");
            return Err(ActionOutcome::NoCurrentCall);
        };
        if current.phase != required {
            debug!(call_id = %current.call_id, phase = ?current.phase, ?required, "transition requested in wrong phase");
            return Err(ActionOutcome::WrongPhase);
        }
        if state.action_in_flight {
            debug!(call_id = %current.call_id, "transition already in flight");
            return Err(ActionOutcome::Busy);
        }
        let call_id = current.call_id;
        state.action_in_flight = true;
        Ok(call_id)
    }

    /// Drops the resolved call and arms the timer for the next one.
    fn resolve_locked(
        self: &Arc<Self>,
        state: &mut ControllerState,
        call_id: CallId,
        resolution: CallResolution,
    ) {
        if state
            .current
            .as_ref()
            .is_some_and(|current| current.call_id == call_id)
        {
            state.current = None;
        }
        let _ = self.events.send(ControllerEvent::CallResolved {
            call_id,
            resolution,
        });
        self.schedule_next(state);
    }

    fn report_failure(&self, err: RegistryOperationFailed, call_id: CallId, message: &str) {
        warn!(%call_id, operation = %err.operation, error = %err, "registry transition failed; state unchanged");
        self.notifier.notify(message, NotificationLevel::Error);
    }

    fn schedule_next(self: &Arc<Self>, state: &mut ControllerState) {
        if !state.enabled {
            debug!("not scheduling; simulation disabled");
            return;
        }
        if state.current.is_some() || state.timer.is_some() || state.creating {
            debug!("not scheduling; a call is current or already pending");
            return;
        }

        let first = !state.first_delay_consumed;
        state.first_delay_consumed = true;
        let delay = self.delays.next_delay(first, &mut rand::thread_rng());

        state.timer_generation += 1;
        let generation = state.timer_generation;
        let controller: Weak<Self> = Arc::downgrade(self);
        state.timer = Some(ScheduledTimer::spawn(generation, delay, async move {
            if let Some(controller) = controller.upgrade() {
                controller.generate_call(Some(generation)).await;
            }
        }));

        debug!(delay_ms = duration_millis(delay), first, "next simulated call scheduled");
        let _ = self.events.send(ControllerEvent::CallScheduled { delay });
    }

    async fn generate_call(self: &Arc<Self>, generation: Option<u64>) {
        let origin_number = {
            let mut state = self.inner.lock().await;
            if let Some(generation) = generation {
                if state.timer.as_ref().map(ScheduledTimer::generation) != Some(generation) {
                    debug!(generation, "stale call timer fired; ignoring");
                    return;
                }
                state.timer = None;
            }
            // Enablement may have flipped since the timer was armed.
            if !state.enabled || state.current.is_some() || state.creating {
                debug!(
                    enabled = state.enabled,
                    has_call = state.current.is_some(),
                    creating = state.creating,
                    "skipping simulated call creation"
                );
                return;
            }
            state.creating = true;
            fresh_origin_number()
        };

        let result = self
            .registry
            .create(self.config.operator_id, &origin_number)
            .await;

        let mut state = self.inner.lock().await;
        state.creating = false;
        match result {
            Ok(record) => {
                let current = CurrentCall::from_record(record);
                let view = current.view();
                state.current = Some(current);
                state.first_delay_consumed = true;
                drop(state);
                info!(call_id = %view.call_id, origin_number = %view.origin_number, "simulated call ringing");
                self.notifier.notify(
                    &format!("Incoming call from {}", view.origin_number),
                    NotificationLevel::Info,
                );
                let _ = self.events.send(ControllerEvent::CallRinging(view));
            }
            Err(source) => {
                let err = RegistryOperationFailed::new(RegistryOperation::Create, source);
                // No retry here; the next call only comes from a later schedule.
                error!(operator_id = %self.config.operator_id, %origin_number, error = %err, "simulated call dropped");
            }
        }
    }
}

fn fresh_origin_number() -> String {
    generate_origin_number(&mut rand::thread_rng())
}

impl Drop for CallLifecycleController {
    fn drop(&mut self) {
        if let Some(timer) = self.inner.get_mut().timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
