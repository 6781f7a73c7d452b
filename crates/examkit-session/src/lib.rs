//! Exam attempt lifecycle.
//!
//! Provides the session state machine, the cancellable countdown timer, and
//! the async driver that serializes user commands with timer ticks.

pub mod driver;
pub mod error;
pub mod machine;
pub mod state;
pub mod timer;

pub use driver::{
    save_refused, AttemptDriver, AttemptOutcome, NoopObserver, SessionCommand, SessionObserver,
};
pub use error::SessionError;
pub use machine::{ExamSession, TickOutcome};
pub use state::{Phase, QuestionStatus, SessionState, StatusCounts, SubmitTrigger};
pub use timer::{TimerCoordinator, TimerEvent, TimerHandle};
