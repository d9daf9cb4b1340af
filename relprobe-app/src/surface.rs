use relprobe_core::{
    DisplaySurface, ResponseKey, ResponseLayout, StimulusRef, SurfaceCommand, Verdict,
};
use relprobe_experiment::TrialRecord;
use tracing::debug;
use winit::event_loop::EventLoopProxy;

#[derive(Debug)]
pub enum UserEvent {
    Surface(SurfaceCommand),
    SessionFinished(Vec<TrialRecord>),
}

/// Forwards drawing calls from the session thread to the window thread.
pub struct ProxySurface {
    proxy: EventLoopProxy<UserEvent>,
}

impl ProxySurface {
    pub fn new(proxy: EventLoopProxy<UserEvent>) -> Self {
        Self { proxy }
    }

    fn send(&self, command: SurfaceCommand) {
        if self.proxy.send_event(UserEvent::Surface(command)).is_err() {
            debug!("event loop closed, dropping surface command");
        }
    }
}

impl DisplaySurface for ProxySurface {
    fn show_stimulus(&mut self, stimulus: &StimulusRef) {
        self.send(SurfaceCommand::ShowStimulus(stimulus.clone()));
    }

    fn show_trial(&mut self, layout: &ResponseLayout) {
        self.send(SurfaceCommand::ShowTrial(layout.clone()));
    }

    fn mark_response(&mut self, key: ResponseKey, verdict: Verdict) {
        self.send(SurfaceCommand::MarkResponse { key, verdict });
    }

    fn show_notice(&mut self, text: &str) {
        self.send(SurfaceCommand::ShowNotice(text.to_string()));
    }

    fn clear(&mut self) {
        self.send(SurfaceCommand::Clear);
    }
}
