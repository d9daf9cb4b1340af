use serde::{Deserialize, Serialize};

/// Block of a session a probe trial belongs to.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Practice,
    Training,
    Testing,
}

impl SessionPhase {
    /// Practice and training give correctness feedback, testing does not.
    pub fn feedback_enabled(&self) -> bool {
        !matches!(self, SessionPhase::Testing)
    }

    pub fn shows_timeout_notice(&self) -> bool {
        self.feedback_enabled()
    }

    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Practice => Training,
            Training => Testing,
            Testing => return None,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Practice => "practice",
            SessionPhase::Training => "training",
            SessionPhase::Testing => "testing",
        }
    }
}
