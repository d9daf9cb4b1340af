pub mod config;
pub mod controller;
pub mod plan;
pub mod runner;
pub mod session;

pub use config::ExperimentConfig;
pub use controller::{ArmedTimer, Step, TimerKind, TimerToken, TrialController};
pub use plan::{PlanError, PlannedTrial, SessionPlan, SessionTrial};
pub use runner::{run_trial, run_trial_with_layout};
pub use session::{run_session, PhaseSummary, SessionSummary, TrialRecord};
