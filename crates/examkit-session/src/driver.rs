//! Async attempt driver.
//!
//! [`AttemptDriver::run`] is the single event loop for one attempt. User
//! commands and timer ticks arrive on two channels and are handled one at a
//! time, so the session is never mutated concurrently. Commands are polled
//! first: a command that is already queued when a tick becomes ready is
//! applied before the tick.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use examkit_core::error::StoreError;
use examkit_core::model::{Exam, SubmittedAnswer};
use examkit_core::report::ExamReport;
use examkit_core::results::ScoreResult;
use examkit_core::traits::ReportStore;

use crate::error::SessionError;
use crate::machine::{ExamSession, TickOutcome};
use crate::state::{Phase, SubmitTrigger};
use crate::timer::{TimerCoordinator, TimerEvent, TimerHandle};

const TIMER_QUEUE_DEPTH: usize = 8;

/// A user action fed into the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Answer(SubmittedAnswer),
    /// Typed input, shaped by the current question's type.
    AnswerInput(String),
    Goto(usize),
    Next,
    Previous,
    SaveAndNext,
    ClearResponse,
    MarkForReviewAndNext,
    Submit(SubmitTrigger),
    Review,
    Back,
    Retake,
    Exit,
}

impl SessionCommand {
    fn apply(&self, session: &mut ExamSession) -> Result<(), SessionError> {
        match self {
            SessionCommand::Start => session.start(),
            SessionCommand::Answer(value) => session.answer(value.clone()),
            SessionCommand::AnswerInput(input) => session.answer_input(input),
            SessionCommand::Goto(index) => session.goto(*index),
            SessionCommand::Next => session.next(),
            SessionCommand::Previous => session.previous(),
            SessionCommand::SaveAndNext => session.save_and_next(),
            SessionCommand::ClearResponse => session.clear_response(),
            SessionCommand::MarkForReviewAndNext => session.mark_for_review_and_next(),
            SessionCommand::Submit(trigger) => session.submit(*trigger).map(|_| ()),
            SessionCommand::Review => session.review(),
            SessionCommand::Back => session.back(),
            SessionCommand::Retake => session.retake(),
            SessionCommand::Exit => {
                session.exit();
                Ok(())
            }
        }
    }
}

/// Callback for attempt progress (e.g., a terminal UI).
pub trait SessionObserver: Send + Sync {
    /// Called after every applied command, with the updated session.
    fn on_update(&self, session: &ExamSession);
    fn on_phase_change(&self, from: Phase, to: Phase);
    fn on_tick(&self, remaining_secs: u64);
    fn on_result(&self, result: &ScoreResult, trigger: SubmitTrigger);
    fn on_persisted(&self, report: &ExamReport);
    fn on_persist_failed(&self, error: &anyhow::Error);
    fn on_command_rejected(&self, command: &SessionCommand, error: &SessionError);
}

/// No-op session observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_update(&self, _: &ExamSession) {}
    fn on_phase_change(&self, _: Phase, _: Phase) {}
    fn on_tick(&self, _: u64) {}
    fn on_result(&self, _: &ScoreResult, _: SubmitTrigger) {}
    fn on_persisted(&self, _: &ExamReport) {}
    fn on_persist_failed(&self, _: &anyhow::Error) {}
    fn on_command_rejected(&self, _: &SessionCommand, _: &SessionError) {}
}

/// How an attempt loop ended.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub phase: Phase,
    /// The most recent scored result, kept even after exit.
    pub result: Option<ScoreResult>,
    /// Id of the report handed to the store for that result.
    pub report_id: Option<Uuid>,
    /// Whether the store accepted that report.
    pub persisted: bool,
}

/// Drives one [`ExamSession`] from a command channel and its own timer.
pub struct AttemptDriver {
    session: ExamSession,
    user_id: String,
    store: Arc<dyn ReportStore>,
    timer: TimerCoordinator,
    active_timer: Option<TimerHandle>,
    epoch: u64,
    tick_tx: mpsc::Sender<TimerEvent>,
    tick_rx: mpsc::Receiver<TimerEvent>,
    last_result: Option<ScoreResult>,
    report_id: Option<Uuid>,
    persisted: bool,
}

impl AttemptDriver {
    pub fn new(
        exam: Arc<Exam>,
        user_id: impl Into<String>,
        store: Arc<dyn ReportStore>,
        timer: TimerCoordinator,
    ) -> Self {
        Self::from_session(ExamSession::new(exam), user_id, store, timer)
    }

    /// Drive an existing (possibly resumed) session. A session already in
    /// the questions phase gets its timer restarted from the stored
    /// remaining time when [`run`](Self::run) begins.
    pub fn from_session(
        session: ExamSession,
        user_id: impl Into<String>,
        store: Arc<dyn ReportStore>,
        timer: TimerCoordinator,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel(TIMER_QUEUE_DEPTH);
        let last_result = session.result().cloned();
        Self {
            session,
            user_id: user_id.into(),
            store,
            timer,
            active_timer: None,
            epoch: 0,
            tick_tx,
            tick_rx,
            last_result,
            report_id: None,
            persisted: false,
        }
    }

    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    /// Run the loop on a background task.
    pub fn spawn(
        self,
        observer: Arc<dyn SessionObserver>,
    ) -> (mpsc::Sender<SessionCommand>, JoinHandle<AttemptOutcome>) {
        let (tx, rx) = mpsc::channel(32);
        let handle = tokio::spawn(async move { self.run(rx, observer.as_ref()).await });
        (tx, handle)
    }

    /// Process commands and ticks until `Exit` or until the command channel
    /// closes.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        observer: &dyn SessionObserver,
    ) -> AttemptOutcome {
        if self.session.phase() == Phase::Questions {
            self.start_timer();
        }

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => {
                        if self.handle_command(command, observer).await {
                            break;
                        }
                    }
                    None => {
                        debug!("command channel closed");
                        break;
                    }
                },
                Some(event) = self.tick_rx.recv() => {
                    self.handle_tick(event, observer).await;
                }
            }
        }

        self.stop_timer();
        AttemptOutcome {
            phase: self.session.phase(),
            result: self.last_result,
            report_id: self.report_id,
            persisted: self.persisted,
        }
    }

    /// Returns true when the loop should stop.
    async fn handle_command(
        &mut self,
        command: SessionCommand,
        observer: &dyn SessionObserver,
    ) -> bool {
        let before = self.session.phase();
        if let Err(e) = command.apply(&mut self.session) {
            debug!(?command, error = %e, "command rejected");
            observer.on_command_rejected(&command, &e);
            return false;
        }
        let after = self.session.phase();
        if before != after {
            self.on_transition(before, after, observer).await;
        }
        observer.on_update(&self.session);
        command == SessionCommand::Exit
    }

    async fn handle_tick(&mut self, event: TimerEvent, observer: &dyn SessionObserver) {
        if self.active_timer.as_ref().map(TimerHandle::epoch) != Some(event.epoch) {
            debug!(epoch = event.epoch, current = self.epoch, "dropping stale tick");
            return;
        }
        match self.session.tick() {
            TickOutcome::Idle => {}
            TickOutcome::Running(remaining) => observer.on_tick(remaining),
            TickOutcome::Expired => {
                observer.on_tick(0);
                self.on_transition(Phase::Questions, self.session.phase(), observer)
                    .await;
            }
        }
    }

    async fn on_transition(&mut self, from: Phase, to: Phase, observer: &dyn SessionObserver) {
        if from == Phase::Questions {
            self.stop_timer();
        }
        if to == Phase::Questions {
            self.start_timer();
        }
        observer.on_phase_change(from, to);

        if from == Phase::Questions && to == Phase::Result {
            if let Some(result) = self.session.result().cloned() {
                if let Some(trigger) = self.session.submitted_by() {
                    observer.on_result(&result, trigger);
                }
                self.persist(result, observer).await;
            }
        }
    }

    async fn persist(&mut self, result: ScoreResult, observer: &dyn SessionObserver) {
        let report = ExamReport::new(self.session.exam(), &self.user_id, result.clone());
        self.last_result = Some(result);
        self.report_id = Some(report.id);
        self.persisted = false;

        match self.store.save(&report).await {
            Ok(()) => {
                info!(
                    report = %report.id,
                    store = self.store.name(),
                    user = %self.user_id,
                    "report saved"
                );
                self.persisted = true;
                observer.on_persisted(&report);
            }
            Err(e) => {
                warn!(
                    report = %report.id,
                    store = self.store.name(),
                    refused = save_refused(&e),
                    "failed to save report: {e:#}"
                );
                observer.on_persist_failed(&e);
            }
        }
    }

    fn start_timer(&mut self) {
        self.stop_timer();
        self.epoch += 1;
        // A session with no time left still needs one tick to expire.
        let ticks = self.session.remaining_secs().max(1);
        self.active_timer = Some(self.timer.start(self.epoch, ticks, self.tick_tx.clone()));
    }

    fn stop_timer(&mut self) {
        if let Some(handle) = self.active_timer.take() {
            handle.cancel();
        }
    }
}

/// Whether a failed save was refused by the store, so saving the same report
/// again cannot succeed.
pub fn save_refused(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_permanent)
}
