//! Percentage and pass/fail computation for a finished quiz.

/// Minimum percentage that counts as a pass.
pub const PASS_MARK: u32 = 60;

/// Outcome of scoring a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub percentage: u32,
    pub passed: bool,
}

/// Percentage of correct answers, rounded half up to the nearest integer.
///
/// A zero `total` yields 0 instead of dividing by zero.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    let rounded = (200 * score + total) / (2 * total);
    // bounded by 100 because score <= total
    u32::try_from(rounded).unwrap_or(100)
}

/// Score a session: percentage plus pass/fail against `PASS_MARK`.
///
/// # Examples
///
/// ```
/// # use ktet_core::scoring::compute_result;
/// let grade = compute_result(3, 5);
/// assert_eq!(grade.percentage, 60);
/// assert!(grade.passed);
/// ```
#[must_use]
pub fn compute_result(score: u32, total: u32) -> Grade {
    let percentage = percentage(score, total);
    Grade {
        percentage,
        passed: percentage >= PASS_MARK,
    }
}
