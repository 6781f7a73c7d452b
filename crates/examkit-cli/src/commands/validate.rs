//! The `examkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examkit_core::parser;

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let exams = if exam_path.is_dir() {
        parser::load_exam_directory(&exam_path)?
    } else {
        vec![parser::parse_exam(&exam_path)?]
    };

    if exams.is_empty() {
        anyhow::bail!("no exam files found in {}", exam_path.display());
    }

    let mut total_warnings = 0;

    for exam in &exams {
        println!(
            "Exam: {} ({} questions, {} marks, {}s)",
            exam.name,
            exam.question_count(),
            exam.achievable_marks(),
            exam.duration_secs
        );

        let warnings = parser::validate_exam(exam);
        for warning in &warnings {
            match &warning.question_id {
                Some(id) => println!("  [{id}] WARNING: {}", warning.message),
                None => println!("   WARNING: {}", warning.message),
            }
        }
        total_warnings += warnings.len();
    }

    match total_warnings {
        0 => println!("All exams valid."),
        n => println!("\n{n} warning(s) found in {} exam(s).", exams.len()),
    }

    Ok(())
}
