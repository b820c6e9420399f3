use std::fmt;

use ktet_core::model::{EXAM_CATEGORY_LABEL, OPTION_COUNT, Question, QuestionId, QuizMode};
use ktet_core::scoring::{Grade, compute_result};

use super::progress::SessionProgress;
use super::timer::{ExamTimer, TimerEvent};
use crate::error::SessionError;
use crate::settings::QuizSettings;

//
// ─── STATES AND OUTCOMES ───────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Exam sessions wait here until the user explicitly starts.
    NotStarted,
    AwaitingAnswer,
    ShowingFeedback,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every question was answered or skipped.
    Completed,
    /// The overall exam countdown reached zero.
    TimeExpired,
    /// The user left early. Abandoned sessions are discarded, not reported.
    Abandoned,
}

/// What happened to one question of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    /// `None` when the per-question countdown skipped the question.
    pub selected: Option<usize>,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Recorded { correct: bool },
    /// An option was already chosen for this question; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Next { index: usize },
    Finished,
}

/// Effect of feeding elapsed seconds into an exam session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct TickOutcome {
    /// Questions auto-skipped by the per-question countdown.
    pub skipped: usize,
    /// The session reached `Finished` during these ticks.
    pub finished: bool,
}

/// Everything the result reporter needs once a session is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub mode: QuizMode,
    pub category: String,
    pub score: u32,
    pub total: u32,
    pub grade: Grade,
    pub question_ids: Vec<QuestionId>,
    pub reason: FinishReason,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt over a fixed, ordered question list.
///
/// Moves strictly forward: each question is answered at most once and there is
/// no way back. Exam sessions additionally carry an `ExamTimer` driven through
/// `on_tick`.
pub struct QuizSession {
    mode: QuizMode,
    category: String,
    questions: Vec<Question>,
    current: usize,
    score: u32,
    selected: Option<usize>,
    phase: SessionPhase,
    answers: Vec<AnswerRecord>,
    timer: Option<ExamTimer>,
    finish_reason: Option<FinishReason>,
    reported: bool,
}

impl QuizSession {
    /// Create a standard session, ready for the first answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn standard(
        category: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, SessionError> {
        Self::new(QuizMode::Standard, category.into(), questions, None)
    }

    /// Create an exam session. It stays `NotStarted` until `start` is called.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn exam(questions: Vec<Question>, settings: &QuizSettings) -> Result<Self, SessionError> {
        let timer = ExamTimer::new(
            settings.exam_duration_secs(),
            settings.question_duration_secs(),
        );
        Self::new(
            QuizMode::Exam,
            EXAM_CATEGORY_LABEL.to_owned(),
            questions,
            Some(timer),
        )
    }

    fn new(
        mode: QuizMode,
        category: String,
        questions: Vec<Question>,
        timer: Option<ExamTimer>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        let phase = match mode {
            QuizMode::Standard => SessionPhase::AwaitingAnswer,
            QuizMode::Exam => SessionPhase::NotStarted,
        };

        Ok(Self {
            mode,
            category,
            answers: Vec::with_capacity(questions.len()),
            questions,
            current: 0,
            score: 0,
            selected: None,
            phase,
            timer,
            finish_reason: None,
            reported: false,
        })
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    /// Category name, or the exam label for exam sessions.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    #[must_use]
    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_finished() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn timer(&self) -> Option<&ExamTimer> {
        self.timer.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: (self.current + 1).min(self.questions.len()),
            total: self.questions.len(),
            answered: self.answers.len(),
            score: self.score,
            is_complete: self.is_finished(),
        }
    }

    /// Start an exam. Standard sessions are already running, so this is a no-op for them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinished` for a finished session.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Finished => Err(SessionError::AlreadyFinished),
            SessionPhase::NotStarted => {
                self.phase = SessionPhase::AwaitingAnswer;
                if let Some(timer) = self.timer.as_mut() {
                    timer.reset_question();
                }
                Ok(())
            }
            SessionPhase::AwaitingAnswer | SessionPhase::ShowingFeedback => Ok(()),
        }
    }

    /// Choose an option for the current question.
    ///
    /// Only the first choice per question counts; later calls return
    /// `SelectOutcome::Ignored` and change nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before an exam is started,
    /// `SessionError::AlreadyFinished` after the session ends, and
    /// `SessionError::InvalidOption` for an index past the last option.
    pub fn select_option(&mut self, index: usize) -> Result<SelectOutcome, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Finished => return Err(SessionError::AlreadyFinished),
            SessionPhase::ShowingFeedback => return Ok(SelectOutcome::Ignored),
            SessionPhase::AwaitingAnswer => {}
        }
        if index >= OPTION_COUNT {
            return Err(SessionError::InvalidOption { index });
        }

        let question = &self.questions[self.current];
        let correct = question.is_correct(index);
        if correct {
            self.score += 1;
        }
        self.answers.push(AnswerRecord {
            question_id: question.id().clone(),
            selected: Some(index),
            correct,
        });
        self.selected = Some(index);
        self.phase = SessionPhase::ShowingFeedback;

        Ok(SelectOutcome::Recorded { correct })
    }

    /// Move past the answered question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` while the current question is
    /// unanswered, plus the same phase errors as `select_option`.
    pub fn advance(&mut self) -> Result<SessionStep, SessionError> {
        match self.phase {
            SessionPhase::NotStarted => Err(SessionError::NotStarted),
            SessionPhase::Finished => Err(SessionError::AlreadyFinished),
            SessionPhase::AwaitingAnswer => Err(SessionError::NoSelection),
            SessionPhase::ShowingFeedback => Ok(self.move_next()),
        }
    }

    /// Feed elapsed seconds into the exam countdowns.
    ///
    /// Ticks are ignored for standard sessions, before the exam starts, and
    /// after it finishes. Each second may auto-skip the current question or
    /// end the exam.
    pub fn on_tick(&mut self, elapsed_secs: u32) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        for _ in 0..elapsed_secs {
            if matches!(
                self.phase,
                SessionPhase::NotStarted | SessionPhase::Finished
            ) {
                break;
            }
            let question_running = self.phase == SessionPhase::AwaitingAnswer;
            let Some(timer) = self.timer.as_mut() else {
                break;
            };

            match timer.tick_second(question_running) {
                TimerEvent::Running => {}
                TimerEvent::QuestionExpired => {
                    outcome.skipped += 1;
                    if self.skip_current() == SessionStep::Finished {
                        outcome.finished = true;
                    }
                }
                TimerEvent::OverallExpired => {
                    self.end(FinishReason::TimeExpired);
                    outcome.finished = true;
                }
            }
        }

        outcome
    }

    /// End the session early on user exit. Stops the timers; nothing is reported.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyFinished` if the session already ended.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::AlreadyFinished);
        }
        self.end(FinishReason::Abandoned);
        Ok(())
    }

    /// Result data for the reporter, available once the session completed or timed out.
    #[must_use]
    pub fn outcome(&self) -> Option<SessionOutcome> {
        let reason = self
            .finish_reason
            .filter(|reason| *reason != FinishReason::Abandoned)?;
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        Some(SessionOutcome {
            mode: self.mode,
            category: self.category.clone(),
            score: self.score,
            total,
            grade: compute_result(self.score, total),
            question_ids: self.questions.iter().map(|q| q.id().clone()).collect(),
            reason,
        })
    }

    fn skip_current(&mut self) -> SessionStep {
        self.answers.push(AnswerRecord {
            question_id: self.questions[self.current].id().clone(),
            selected: None,
            correct: false,
        });
        self.move_next()
    }

    fn move_next(&mut self) -> SessionStep {
        self.current += 1;
        self.selected = None;

        if self.current < self.questions.len() {
            self.phase = SessionPhase::AwaitingAnswer;
            if let Some(timer) = self.timer.as_mut() {
                timer.reset_question();
            }
            SessionStep::Next {
                index: self.current,
            }
        } else {
            self.end(FinishReason::Completed);
            SessionStep::Finished
        }
    }

    fn end(&mut self, reason: FinishReason) {
        self.phase = SessionPhase::Finished;
        self.finish_reason = Some(reason);
    }

    pub(crate) fn is_reported(&self) -> bool {
        self.reported
    }

    pub(crate) fn mark_reported(&mut self) {
        self.reported = true;
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode)
            .field("category", &self.category)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .field("timer", &self.timer)
            .field("finish_reason", &self.finish_reason)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
