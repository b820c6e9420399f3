/// What a single one-second tick did to the exam countdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerEvent {
    Running,
    QuestionExpired,
    OverallExpired,
}

/// Overall and per-question countdowns of an exam session.
///
/// Driven by one-second ticks from whatever scheduler owns the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamTimer {
    overall_remaining: u32,
    question_remaining: u32,
    question_duration: u32,
}

impl ExamTimer {
    #[must_use]
    pub fn new(overall_secs: u32, question_secs: u32) -> Self {
        Self {
            overall_remaining: overall_secs,
            question_remaining: question_secs,
            question_duration: question_secs,
        }
    }

    #[must_use]
    pub fn overall_remaining(&self) -> u32 {
        self.overall_remaining
    }

    #[must_use]
    pub fn question_remaining(&self) -> u32 {
        self.question_remaining
    }

    /// Restart the per-question countdown for a newly current question.
    pub(crate) fn reset_question(&mut self) {
        self.question_remaining = self.question_duration;
    }

    /// Advance both countdowns by one second.
    ///
    /// The per-question countdown only runs while `question_running`. The
    /// overall countdown reaching zero wins over a simultaneous question expiry.
    pub(crate) fn tick_second(&mut self, question_running: bool) -> TimerEvent {
        if self.overall_remaining <= 1 {
            self.overall_remaining = 0;
            return TimerEvent::OverallExpired;
        }
        self.overall_remaining -= 1;

        if question_running {
            if self.question_remaining <= 1 {
                self.question_remaining = 0;
                return TimerEvent::QuestionExpired;
            }
            self.question_remaining -= 1;
        }

        TimerEvent::Running
    }
}
