//! End-to-end pipeline tests over the sample exams in the repository.
//!
//! These drive the whole stack (exam loading → attempt driver → scoring →
//! report store → rendering) without the terminal front end.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use examkit_core::model::Exam;
use examkit_core::parser::{parse_answer_sheet, parse_exam};
use examkit_core::report::ExamReport;
use examkit_core::results::{ScoreResult, Verdict};
use examkit_core::scoring::score_exam;
use examkit_core::traits::ReportStore;
use examkit_report::generate_html;
use examkit_session::{
    AttemptDriver, ExamSession, Phase, SessionCommand, SessionError, SessionObserver,
    SessionState, SubmitTrigger, TimerCoordinator,
};
use examkit_store::{FileReportStore, MemoryReportStore};

fn walkthrough() -> Arc<Exam> {
    Arc::new(parse_exam(Path::new("../../exams/walkthrough.toml")).unwrap())
}

#[derive(Default)]
struct Triggers(Mutex<Vec<SubmitTrigger>>);

impl SessionObserver for Triggers {
    fn on_update(&self, _: &ExamSession) {}
    fn on_phase_change(&self, _: Phase, _: Phase) {}
    fn on_tick(&self, _: u64) {}
    fn on_result(&self, _: &ScoreResult, trigger: SubmitTrigger) {
        self.0.lock().unwrap().push(trigger);
    }
    fn on_persisted(&self, _: &ExamReport) {}
    fn on_persist_failed(&self, _: &anyhow::Error) {}
    fn on_command_rejected(&self, _: &SessionCommand, _: &SessionError) {}
}

// --- Timed attempts ---

#[tokio::test(start_paused = true)]
async fn e2e_timer_expiry_submits_answers_on_screen() {
    let store = Arc::new(MemoryReportStore::new());
    let triggers = Arc::new(Triggers::default());
    let driver = AttemptDriver::new(
        walkthrough(),
        "erin",
        store.clone(),
        TimerCoordinator::new(Duration::from_secs(1)),
    );
    let (tx, handle) = driver.spawn(triggers.clone());

    tx.send(SessionCommand::Start).await.unwrap();
    tx.send(SessionCommand::AnswerInput("A".into())).await.unwrap();
    tx.send(SessionCommand::SaveAndNext).await.unwrap();
    // Typed on Q2 but never saved; still part of the sheet at expiry.
    tx.send(SessionCommand::AnswerInput("12".into())).await.unwrap();

    tokio::time::sleep(Duration::from_secs(75)).await;
    tx.send(SessionCommand::Exit).await.unwrap();
    let outcome = handle.await.unwrap();

    assert_eq!(*triggers.0.lock().unwrap(), vec![SubmitTrigger::TimerExpired]);
    assert_eq!(store.save_count(), 1);
    assert!(outcome.persisted);

    let result = outcome.result.unwrap();
    assert!((result.obtained_marks - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.display_marks(), 1);
    assert_eq!(result.verdict, Verdict::Fail);
    assert_eq!(result.calculation_details.unattempted, 1);
}

#[tokio::test(start_paused = true)]
async fn e2e_submit_persists_to_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileReportStore::new(dir.path()).unwrap());
    let driver = AttemptDriver::new(
        walkthrough(),
        "frank",
        store.clone(),
        TimerCoordinator::new(Duration::from_secs(1)),
    );
    let (tx, handle) = driver.spawn(Arc::new(Triggers::default()));

    for command in [
        SessionCommand::Start,
        SessionCommand::AnswerInput("A".into()),
        SessionCommand::SaveAndNext,
        SessionCommand::AnswerInput("7".into()),
        SessionCommand::SaveAndNext,
        SessionCommand::AnswerInput("C,A".into()),
        SessionCommand::Submit(SubmitTrigger::Button),
    ] {
        tx.send(command).await.unwrap();
    }
    drop(tx);
    let outcome = handle.await.unwrap();
    assert_eq!(outcome.phase, Phase::Result);

    let stored = store.list_by_user("frank").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(Some(stored[0].id), outcome.report_id);
    assert_eq!(stored[0].exam_id, "walkthrough");
    assert_eq!(stored[0].result.obtained_marks, 4.0);
    assert_eq!(stored[0].result.verdict, Verdict::Pass);
}

#[tokio::test(start_paused = true)]
async fn e2e_resumed_snapshot_keeps_counting_down() {
    let exam = walkthrough();
    let mut session = ExamSession::new(exam.clone());
    session.start().unwrap();
    session.answer_input("A").unwrap();
    session.save_and_next().unwrap();
    for _ in 0..50 {
        let _ = session.tick();
    }

    let json = serde_json::to_string(&session.snapshot()).unwrap();
    let state: SessionState = serde_json::from_str(&json).unwrap();
    let resumed = ExamSession::resume(exam, state).unwrap();
    assert_eq!(resumed.remaining_secs(), 10);
    assert_eq!(resumed.current_index(), 1);

    let store = Arc::new(MemoryReportStore::new());
    let driver = AttemptDriver::from_session(
        resumed,
        "gina",
        store.clone(),
        TimerCoordinator::new(Duration::from_secs(1)),
    );
    let (tx, handle) = driver.spawn(Arc::new(Triggers::default()));

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(store.save_count(), 0);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(store.save_count(), 1);

    drop(tx);
    let outcome = handle.await.unwrap();
    assert_eq!(outcome.result.unwrap().obtained_marks, 1.0);
}

// --- Batch scoring and rendering ---

#[test]
fn e2e_answer_sheets_score_as_expected() {
    let exam = walkthrough();
    let dir = Path::new("../../answers/walkthrough");

    let score = |user: &str| {
        let answers = parse_answer_sheet(&dir.join(format!("{user}.json"))).unwrap();
        score_exam(&exam, &answers)
    };

    let alice = score("alice");
    assert!((alice.obtained_marks - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(alice.verdict, Verdict::Fail);

    let bob = score("bob");
    assert_eq!(bob.obtained_marks, 4.0);
    assert_eq!(bob.verdict, Verdict::Pass);

    let carol = score("carol");
    assert_eq!(carol.obtained_marks, 0.0);
    assert_eq!(carol.calculation_details.unattempted, 3);
}

#[test]
fn e2e_html_for_scored_sheet() {
    let exam = walkthrough();
    let answers = parse_answer_sheet(Path::new("../../answers/walkthrough/alice.json")).unwrap();
    let report = ExamReport::new(&exam, "alice", score_exam(&exam, &answers));

    let html = generate_html(&report, &exam, &answers);
    assert!(html.contains("<th>Obtained Marks</th><td>1</td>"));
    assert!(html.contains("<strong>0.67</strong>"));
    assert!(html.contains("class=\"fail\">Fail</td>"));
    assert!(html.contains("5 to 10"));
}

#[test]
fn e2e_json_exam_with_every_question_type() {
    let exam = parse_exam(Path::new("../../exams/general-knowledge.json")).unwrap();
    assert_eq!(exam.question_count(), 5);
    assert_eq!(exam.achievable_marks(), 11);
    assert!(exam.questions.iter().all(|q| !q.kind.is_malformed()));
    assert!(examkit_core::parser::validate_exam(&exam).is_empty());
}
