pub mod grade;
pub mod init;
pub mod reports;
pub mod score;
pub mod take;
pub mod validate;

use examkit_store::ExamkitConfig;

/// The user id to record: the flag, then the configured default.
fn resolve_user(flag: Option<String>, config: &ExamkitConfig) -> String {
    flag.or_else(|| config.default_user.clone())
        .unwrap_or_else(|| "anonymous".to_string())
}
