//! The `examkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examkit.toml").exists() {
        println!("examkit.toml already exists, skipping.");
    } else {
        std::fs::write("examkit.toml", SAMPLE_CONFIG)?;
        println!("Created examkit.toml");
    }

    std::fs::create_dir_all("exams")?;
    let sample_path = std::path::Path::new("exams/sample.toml");
    if sample_path.exists() {
        println!("exams/sample.toml already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_EXAM)?;
        println!("Created exams/sample.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit examkit.toml to choose where reports are stored");
    println!("  2. Run: examkit validate --exam exams/sample.toml");
    println!("  3. Run: examkit take --exam exams/sample.toml --user you");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examkit configuration

default_user = "anonymous"
tick_period_ms = 1000
parallelism = 4
output_dir = "./examkit-results"

[store]
type = "file"
dir = "./examkit-reports"

# Remote reports API:
# [store]
# type = "http"
# base_url = "https://exams.example.com"
# token = "${EXAMKIT_API_TOKEN}"
"#;

const SAMPLE_EXAM: &str = r#"[exam]
id = "sample"
name = "Sample Exam"
category = "General"
duration = 300
passing_marks = 3

[[questions]]
id = "capital"
name = "What is the capital of France?"
type = "MCQ"
marks = 1
correct_option = "A"

[questions.options]
A = "Paris"
B = "Rome"
C = "Madrid"
D = "Berlin"

[[questions]]
id = "primes"
name = "Which of these are prime numbers?"
type = "MSQ"
marks = 2
correct_options = ["A", "C"]

[questions.options]
A = "2"
B = "4"
C = "7"
D = "9"

[[questions]]
id = "boiling"
name = "Boiling point of water at sea level, in degrees Celsius?"
type = "NAT"
marks = 1
nat_min = 99.5
nat_max = 100.5

[[questions]]
id = "sun"
name = "The Sun is a star."
type = "TrueFalse"
marks = 1
correct_option = "True"
"#;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use examkit_core::parser::{parse_exam_str, validate_exam, ExamFormat};

    #[test]
    fn sample_files_parse() {
        let exam = parse_exam_str(SAMPLE_EXAM, ExamFormat::Toml, Path::new("sample.toml")).unwrap();
        assert_eq!(exam.question_count(), 4);
        assert_eq!(exam.achievable_marks(), 5);
        assert!(exam.questions.iter().all(|q| !q.kind.is_malformed()));
        assert!(validate_exam(&exam).is_empty());

        let config = examkit_store::config::parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.parallelism, 4);
    }
}
