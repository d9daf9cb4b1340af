use std::time::Duration;

use relprobe_core::{
    KeyPress, Relation, ResponseKey, SessionPhase, StimulusRef, SurfaceCommand, Verdict,
};
use relprobe_experiment::{run_session, SessionPlan, SessionSummary};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

const PLAN: &str = r#"{
    "trials": [
        { "inference": "g2/training_probes/1/b1_b3_stable.png",
          "probe": "g2/training_probes/1/b1_b3_above.png",
          "correct_relation": "above", "phase": "training" },
        { "probe": "g1/test_probes/7/b2_b4_left.png",
          "correct_relation": 1, "phase": "testing" }
    ]
}"#;

#[tokio::test(start_paused = true)]
async fn training_timeout_shows_notice_then_testing_records_answer() {
    let plan = SessionPlan::from_json_str(PLAN).unwrap();
    let trials = plan.trials().unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let start = Instant::now();

    // inference 6000 + probe timeout 6000 + notice 1000 + ITI 500, then 700 into the test probe
    let answer_at = start + ms(6000 + 6000 + 1000 + 500 + 700);
    tokio::spawn(async move {
        time::sleep_until(answer_at).await;
        let _ = tx.send(KeyPress::now(ResponseKey::ArrowLeft)).await;
    });

    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let records = run_session(&plan.config, &trials, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(14_200));
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].phase, SessionPhase::Training);
    assert!(records[0].timed_out());
    assert_eq!(records[0].correct_relation, Relation::Above);

    assert_eq!(records[1].phase, SessionPhase::Testing);
    assert_eq!(records[1].correct_relation, Relation::Left);
    assert_eq!(records[1].result.reaction_time_ms(), Some(700));
    assert_eq!(records[1].result.is_correct(), Some(true));

    let kinds: Vec<&str> = surface
        .iter()
        .map(|c| match c {
            SurfaceCommand::ShowStimulus(_) => "stimulus",
            SurfaceCommand::ShowTrial(_) => "trial",
            SurfaceCommand::MarkResponse { .. } => "mark",
            SurfaceCommand::ShowNotice(_) => "notice",
            SurfaceCommand::Clear => "clear",
        })
        .collect();
    assert_eq!(
        kinds,
        ["stimulus", "trial", "clear", "notice", "clear", "trial", "clear", "clear"]
    );
    assert_eq!(
        surface[0],
        SurfaceCommand::ShowStimulus(StimulusRef::from("g2/training_probes/1/b1_b3_stable.png"))
    );
    assert_eq!(surface[3], SurfaceCommand::ShowNotice("Time-out".into()));

    let summary = SessionSummary::from_records(&records);
    assert_eq!(summary.phase(SessionPhase::Training).unwrap().timeouts, 1);
    assert_eq!(summary.phase(SessionPhase::Testing).unwrap().correct, 1);
}

#[tokio::test(start_paused = true)]
async fn testing_timeout_skips_the_notice() {
    let plan = SessionPlan::from_json_str(
        r#"{"config": {"trial_duration_ms": 1000},
            "trials": [{"probe": "p.png", "correct_relation": "below", "phase": "testing"}]}"#,
    )
    .unwrap();
    let trials = plan.trials().unwrap();
    let (_tx, mut rx) = mpsc::channel::<KeyPress>(8);
    let start = Instant::now();

    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let records = run_session(&plan.config, &trials, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(1000));
    assert!(records[0].timed_out());
    assert!(!surface.iter().any(|c| matches!(c, SurfaceCommand::ShowNotice(_))));
}

#[tokio::test(start_paused = true)]
async fn practice_answer_gets_feedback_colouring() {
    let plan = SessionPlan::from_json_str(
        r#"{"trials": [{"probe": "p.png", "correct_relation": "notConnected"}]}"#,
    )
    .unwrap();
    let trials = plan.trials().unwrap();
    let (tx, mut rx) = mpsc::channel(8);
    let start = Instant::now();
    tokio::spawn(async move {
        time::sleep(ms(900)).await;
        let _ = tx.send(KeyPress::now(ResponseKey::Space)).await;
    });

    let mut surface: Vec<SurfaceCommand> = Vec::new();
    let records = run_session(&plan.config, &trials, &mut surface, &mut rx).await;

    assert_eq!(start.elapsed(), ms(1900));
    assert_eq!(records[0].phase, SessionPhase::Practice);
    assert_eq!(records[0].result.is_correct(), Some(true));
    assert!(surface.contains(&SurfaceCommand::MarkResponse {
        key: ResponseKey::Space,
        verdict: Verdict::Correct,
    }));
}
