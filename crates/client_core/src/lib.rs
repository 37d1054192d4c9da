//! Simulated inbound-call lifecycle for a support agent's call-handling screen.
//!
//! [`CallLifecycleController`] owns at most one simulated call at a time,
//! schedules the next one on a timer, and reports every registry outcome
//! through a [`Notifier`].

pub mod config;
pub mod controller;
pub mod eligibility;
pub mod error;
pub mod format;
pub mod notifier;
pub mod registry;
mod schedule;

pub use config::SimulatorConfig;
pub use controller::{
    ActionOutcome, CallLifecycleController, CallPhase, CallResolution, CallView,
    ControllerEvent, ControllerSnapshot, LifecycleState,
};
pub use eligibility::{is_simulation_eligible, OperatorRole, Screen};
pub use error::{ConfigError, RegistryOperation, RegistryOperationFailed};
pub use format::{format_duration, generate_origin_number};
pub use notifier::{NotificationLevel, Notifier};
pub use registry::{CallRegistry, HttpCallRegistry};
