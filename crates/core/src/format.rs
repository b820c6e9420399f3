//! Countdown rendering for the exam timers.

/// Render seconds as zero-padded `MM:SS`.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{minutes:02}:{secs:02}")
}

/// Render the overall exam countdown.
///
/// Shows hours and minutes while at least an hour remains, then minutes and
/// seconds.
#[must_use]
pub fn format_exam_clock(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours} Hours, {minutes} Minutes")
    } else {
        format!("{minutes} Minutes, {secs} Seconds")
    }
}
