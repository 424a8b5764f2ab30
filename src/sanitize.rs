//! Identifier sanitization.
//!
//! Turns arbitrary strings into platform-legal resource names and label
//! values: bounded length, restricted alphabet, alphanumeric at both ends.
//! Both transforms are total and idempotent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum length of resource names and label values.
pub const MAX_LENGTH: usize = 63;

/// Length of the random part of a job name suffix.
const RANDOM_SUFFIX_LEN: usize = 5;

static NAME_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Normalize a string into a resource name.
///
/// Lowercases, replaces anything outside `[a-z0-9-]` with `-`, strips
/// non-alphanumeric runs at both ends and truncates to 63 characters.
/// The result matches `^[a-z0-9]([a-z0-9-]*[a-z0-9])?$` or is empty.
///
/// # Examples
///
/// ```
/// use karo::sanitize::sanitize_name;
///
/// assert_eq!(sanitize_name("High_CPU.Alert"), "high-cpu-alert");
/// assert_eq!(sanitize_name("--restart--"), "restart");
/// assert_eq!(sanitize_name("!!!"), "");
/// ```
pub fn sanitize_name(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    bound(&mapped)
}

/// Normalize a string into a label value.
///
/// Case is preserved. Anything outside `[A-Za-z0-9_.-]` becomes `-`, both
/// ends are trimmed to alphanumerics and the result is at most 63 characters.
///
/// # Examples
///
/// ```
/// use karo::sanitize::sanitize_label_value;
///
/// assert_eq!(sanitize_label_value("HighCPU"), "HighCPU");
/// assert_eq!(sanitize_label_value("disk full!"), "disk-full");
/// assert_eq!(sanitize_label_value("_internal_"), "internal");
/// ```
pub fn sanitize_label_value(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    bound(&mapped)
}

/// Trim to alphanumeric boundaries and the length limit. Input must be ASCII.
fn bound(mapped: &str) -> String {
    let trimmed = mapped.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    let truncated = &trimmed[..trimmed.len().min(MAX_LENGTH)];
    truncated
        .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// Collision-resistant suffix for a job name: `{epochSeconds}-{nonce}`.
///
/// The nonce combines a process-wide sequence number with random hex, so two
/// calls in the same process never produce the same suffix and separate
/// processes are unlikely to.
pub fn job_name_suffix(epoch_seconds: i64) -> String {
    let seq = NAME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{:x}{}",
        epoch_seconds,
        seq,
        &random[..RANDOM_SUFFIX_LEN]
    )
}

/// Compose `{rule}-{action}-{suffix}` as a valid resource name.
///
/// The rule/action part is sanitized and shortened so the suffix always
/// survives truncation. Returns `None` when the rule/action part sanitizes
/// to nothing.
pub fn compose_job_name(rule: &str, action: &str, suffix: &str) -> Option<String> {
    let suffix = sanitize_name(suffix);
    let base = sanitize_name(&format!("{}-{}", rule, action));
    if base.is_empty() {
        return None;
    }
    if suffix.is_empty() {
        return Some(base);
    }

    let room = MAX_LENGTH.saturating_sub(suffix.len() + 1);
    let base = base[..base.len().min(room)].trim_end_matches('-');
    if base.is_empty() {
        return Some(suffix[..suffix.len().min(MAX_LENGTH)].to_string());
    }
    Some(format!("{}-{}", base, suffix))
}

/// Generate a unique job name for a rule/action pair at `epoch_seconds`.
pub fn unique_job_name(rule: &str, action: &str, epoch_seconds: i64) -> Option<String> {
    compose_job_name(rule, action, &job_name_suffix(epoch_seconds))
}
