use std::path::PathBuf;

use clap::Parser;
use relprobe_experiment::ExperimentConfig;

/// Block-relation probe experiment.
#[derive(Debug, Parser)]
#[command(name = "relprobe", version, about)]
pub struct Args {
    /// Session plan (JSON) with the trial list and optional config block.
    #[arg(long)]
    pub plan: PathBuf,

    /// TrueType font for button labels and notices. Without it buttons are
    /// drawn unlabeled.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Overrides the plan's response window.
    #[arg(long)]
    pub trial_duration_ms: Option<u64>,

    /// Overrides the plan's feedback duration.
    #[arg(long)]
    pub feedback_duration_ms: Option<u64>,
}

impl Args {
    pub fn apply_overrides(&self, config: &mut ExperimentConfig) {
        if let Some(ms) = self.trial_duration_ms {
            config.trial_duration_ms = ms;
        }
        if let Some(ms) = self.feedback_duration_ms {
            config.feedback_duration_ms = ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_durations() {
        let args = Args::parse_from(["relprobe", "--plan", "p.json", "--trial-duration-ms", "4000"]);
        let mut config = ExperimentConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.trial_duration_ms, 4000);
        assert_eq!(config.feedback_duration_ms, 1000);
    }
}
