//! The `examkit take` command: a timed attempt driven from stdin.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use examkit_core::model::QuestionKind;
use examkit_core::parser::parse_exam;
use examkit_core::report::ExamReport;
use examkit_core::results::ScoreResult;
use examkit_report::build_review;
use examkit_session::{
    save_refused, AttemptDriver, ExamSession, Phase, SessionCommand, SessionError,
    SessionObserver, SubmitTrigger, TimerCoordinator,
};
use examkit_store::config::load_config_from;
use examkit_store::create_store;

use crate::render;

const HELP: &str = "\
Commands:
  start          begin the attempt
  a <answer>     answer the current question (MSQ: letters separated by commas)
  save           save and go to the next question
  clear          clear the current response
  mark           mark for review and go to the next question
  next / prev    move without saving
  goto <n>       jump to question n
  submit / esc   submit the attempt
  review         show the answer review (after submitting)
  back           leave the review
  retake         start over (after submitting)
  exit           leave
  help           show this list";

/// Prints session progress to the terminal.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_update(&self, session: &ExamSession) {
        match session.phase() {
            Phase::Questions => print_question(session),
            Phase::Review => {
                let review = build_review(session.exam(), &session.state().answers);
                println!("{}", render::review_table(&review));
            }
            _ => {}
        }
    }

    fn on_phase_change(&self, _from: Phase, to: Phase) {
        match to {
            Phase::Instructions => println!("\nBack at the instructions. Type `start` to begin."),
            Phase::Result => println!("\n=== Result ==="),
            Phase::Review => println!("\n=== Review ==="),
            Phase::Closed => println!("Session closed."),
            Phase::Questions => {}
        }
    }

    fn on_tick(&self, remaining_secs: u64) {
        if remaining_secs == 0 {
            println!("\nTime is up.");
        } else if remaining_secs % 60 == 0 || remaining_secs <= 10 {
            println!("  [{} left]", render::clock(remaining_secs));
        }
    }

    fn on_result(&self, result: &ScoreResult, trigger: SubmitTrigger) {
        println!("Submitted by {trigger}.");
        println!("{}", render::calculation_line(result));
        println!("Obtained Marks: {}", result.display_marks());
        println!("Wrong Answers: {}", result.wrong_answers.len());
        println!("Verdict: {}", result.verdict);
    }

    fn on_persisted(&self, report: &ExamReport) {
        println!("Result saved (report {}).", report.id);
    }

    fn on_persist_failed(&self, error: &anyhow::Error) {
        eprintln!("Warning: result could not be saved: {error:#}");
        if !save_refused(error) {
            eprintln!("The store may be temporarily unavailable; the result above is final.");
        }
    }

    fn on_command_rejected(&self, _command: &SessionCommand, error: &SessionError) {
        eprintln!("Cannot do that: {error}");
    }
}

fn print_question(session: &ExamSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    println!(
        "\nQ{}/{} [{} | {} mark(s)] {}",
        session.current_index() + 1,
        session.exam().question_count(),
        question.question_type(),
        question.marks.value(),
        question.name
    );
    if let Some(image) = &question.image {
        println!("  image: {image}");
    }
    match &question.kind {
        QuestionKind::Mcq { options, .. } | QuestionKind::Msq { options, .. } => {
            for (letter, text) in options {
                println!("  {letter}) {text}");
            }
        }
        QuestionKind::Nat { .. } => println!("  (enter a number)"),
        QuestionKind::TrueFalse { .. } => println!("  True / False"),
        QuestionKind::Matching {
            matching_pairs,
            matching_options,
            ..
        } => {
            for (key, text) in matching_pairs {
                println!("  {key}: {text}");
            }
            for (letter, text) in matching_options {
                println!("  {letter}) {text}");
            }
        }
        QuestionKind::Malformed { reason, .. } => println!("  (unavailable: {reason})"),
    }
    if let Some(answer) = session.current_answer() {
        println!("  Your answer: {answer}");
    }

    let counts = session.status_counts();
    println!(
        "  answered {} | not answered {} | marked {} | not visited {} | {} left",
        counts.answered,
        counts.not_answered,
        counts.marked_review,
        counts.not_visited,
        render::clock(session.remaining_secs())
    );
}

/// One line of terminal input.
#[derive(Debug, PartialEq)]
enum Input {
    Command(SessionCommand),
    Help,
    Blank,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "" => return Ok(Input::Blank),
        "help" | "?" => return Ok(Input::Help),
        "start" => SessionCommand::Start,
        "a" | "answer" => SessionCommand::AnswerInput(rest.to_string()),
        "save" => SessionCommand::SaveAndNext,
        "clear" => SessionCommand::ClearResponse,
        "mark" => SessionCommand::MarkForReviewAndNext,
        "next" => SessionCommand::Next,
        "prev" | "previous" => SessionCommand::Previous,
        "goto" => match rest.parse::<usize>() {
            Ok(n) if n >= 1 => SessionCommand::Goto(n - 1),
            _ => return Err("goto expects a question number starting at 1".to_string()),
        },
        "submit" => SessionCommand::Submit(SubmitTrigger::Button),
        "esc" => SessionCommand::Submit(SubmitTrigger::EscapeKey),
        "review" => SessionCommand::Review,
        "back" => SessionCommand::Back,
        "retake" => SessionCommand::Retake,
        "exit" | "quit" => SessionCommand::Exit,
        other => return Err(format!("unknown command `{other}` (type `help`)")),
    };
    Ok(Input::Command(command))
}

pub async fn execute(
    exam_path: PathBuf,
    user: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let exam = Arc::new(parse_exam(&exam_path)?);
    let user = super::resolve_user(user, &config);
    let store = create_store(&config.store).context("failed to open report store")?;

    println!("Exam: {}", exam.name);
    println!(
        "{} questions | {} | passing marks {}",
        exam.question_count(),
        render::clock(exam.duration_secs),
        exam.passing_marks
    );
    println!("Correct answers earn their marks. Wrong answers on 1-mark questions cost 1/3, on 2-mark questions 2/3.");
    println!("Type `start` to begin, `help` for commands.");

    let driver = AttemptDriver::new(
        Arc::clone(&exam),
        user,
        store,
        TimerCoordinator::new(config.tick_period()),
    );
    let (commands, handle) = driver.spawn(Arc::new(ConsoleObserver));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_input(&line) {
            Ok(Input::Command(command)) => command,
            Ok(Input::Help) => {
                println!("{HELP}");
                continue;
            }
            Ok(Input::Blank) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        let exit = command == SessionCommand::Exit;
        if commands.send(command).await.is_err() || exit {
            break;
        }
    }
    drop(commands);

    let outcome = handle.await?;
    if let Some(result) = &outcome.result {
        println!(
            "Final score: {} ({})",
            result.display_marks(),
            result.verdict
        );
        if !outcome.persisted {
            eprintln!("Warning: the last result was not saved.");
        }
    }

    Ok(())
}
