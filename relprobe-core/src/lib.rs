pub mod error;
pub mod input;
pub mod layout;
pub mod phase;
pub mod relation;
pub mod trial;

pub use error::ConfigError;
pub use input::{KeyPress, ResponseKey, ValidKeys};
pub use layout::{DisplaySurface, ResponseButton, ResponseLayout, SurfaceCommand, Verdict};
pub use phase::SessionPhase;
pub use relation::{Relation, RelationRepr};
pub use trial::{Response, StimulusRef, TrialConfig, TrialParams, TrialResult, TrialState};
