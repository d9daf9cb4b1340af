use serde::{Deserialize, Serialize};

use crate::input::ResponseKey;
use crate::relation::Relation;
use crate::trial::StimulusRef;

/// Default button captions, in [`ResponseKey::ALL`] order.
pub const DEFAULT_LABELS: [&str; 5] = ["On-top", "Left", "Right", "Below", "Did not connect"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseButton {
    pub key: ResponseKey,
    pub label: String,
}

impl ResponseButton {
    pub fn relation(&self) -> Relation {
        self.key.relation()
    }
}

/// Stimulus plus the response buttons, arranged as four rows:
/// up, left/right, down, and the standalone no-connection button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLayout {
    pub stimulus: StimulusRef,
    rows: [Vec<ResponseButton>; 4],
}

impl ResponseLayout {
    pub fn new(stimulus: StimulusRef) -> Self {
        Self::with_labels(stimulus, DEFAULT_LABELS)
    }

    pub fn with_labels<T: Into<String>>(stimulus: StimulusRef, labels: [T; 5]) -> Self {
        let [up, left, right, down, space]: [String; 5] = labels.map(Into::into);
        let button = |key, label| ResponseButton { key, label };
        Self {
            stimulus,
            rows: [
                vec![button(ResponseKey::ArrowUp, up)],
                vec![
                    button(ResponseKey::ArrowLeft, left),
                    button(ResponseKey::ArrowRight, right),
                ],
                vec![button(ResponseKey::ArrowDown, down)],
                vec![button(ResponseKey::Space, space)],
            ],
        }
    }

    pub fn rows(&self) -> &[Vec<ResponseButton>] {
        &self.rows
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ResponseButton> {
        self.rows.iter().flatten()
    }

    pub fn button(&self, key: ResponseKey) -> Option<&ResponseButton> {
        self.buttons().find(|b| b.key == key)
    }
}

/// The single mutable display region a trial draws into.
///
/// Owned by one running trial at a time; the session hands it from trial to
/// trial.
pub trait DisplaySurface {
    /// Replaces the surface content with a bare stimulus and no controls.
    fn show_stimulus(&mut self, stimulus: &StimulusRef);

    /// Replaces the surface content with the stimulus and response buttons.
    fn show_trial(&mut self, layout: &ResponseLayout);

    /// Highlights the button the participant chose.
    fn mark_response(&mut self, key: ResponseKey, verdict: Verdict);

    fn show_notice(&mut self, text: &str);

    fn clear(&mut self);
}

/// A [`DisplaySurface`] call captured as a value, for surfaces living on
/// another thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    ShowStimulus(StimulusRef),
    ShowTrial(ResponseLayout),
    MarkResponse { key: ResponseKey, verdict: Verdict },
    ShowNotice(String),
    Clear,
}

impl SurfaceCommand {
    pub fn apply<S: DisplaySurface + ?Sized>(self, surface: &mut S) {
        match self {
            SurfaceCommand::ShowStimulus(stimulus) => surface.show_stimulus(&stimulus),
            SurfaceCommand::ShowTrial(layout) => surface.show_trial(&layout),
            SurfaceCommand::MarkResponse { key, verdict } => surface.mark_response(key, verdict),
            SurfaceCommand::ShowNotice(text) => surface.show_notice(&text),
            SurfaceCommand::Clear => surface.clear(),
        }
    }
}

/// Records every call in order.
impl DisplaySurface for Vec<SurfaceCommand> {
    fn show_stimulus(&mut self, stimulus: &StimulusRef) {
        self.push(SurfaceCommand::ShowStimulus(stimulus.clone()));
    }

    fn show_trial(&mut self, layout: &ResponseLayout) {
        self.push(SurfaceCommand::ShowTrial(layout.clone()));
    }

    fn mark_response(&mut self, key: ResponseKey, verdict: Verdict) {
        self.push(SurfaceCommand::MarkResponse { key, verdict });
    }

    fn show_notice(&mut self, text: &str) {
        self.push(SurfaceCommand::ShowNotice(text.to_string()));
    }

    fn clear(&mut self) {
        self.push(SurfaceCommand::Clear);
    }
}
