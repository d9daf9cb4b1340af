use thiserror::Error;

use crate::input::ResponseKey;

/// Rejections raised while building a [`TrialConfig`](crate::TrialConfig).
///
/// These are programming or authoring errors in the trial description. They
/// surface before anything is drawn; a running trial never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("expected exactly {expected} response keys, found {found}")]
    KeyCount { expected: usize, found: usize },

    #[error("key token {0:?} is not one of ArrowUp, ArrowLeft, ArrowRight, ArrowDown or space")]
    UnknownKey(String),

    #[error("response key {0} listed more than once")]
    DuplicateKey(ResponseKey),

    #[error("unknown relation label {0:?}")]
    UnknownRelation(String),

    #[error("legacy relation code {0} is outside 1..=5")]
    UnknownLegacyCode(i64),

    #[error("stimulus reference is empty")]
    EmptyStimulus,
}
