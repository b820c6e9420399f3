use std::env;

use thiserror::Error;

/// Subjects of the KTET Category I paper, in the order the exam draws them.
pub const DEFAULT_EXAM_SUBJECTS: [&str; 5] = [
    "Child Development & Pedagogy",
    "Mathematics",
    "Science",
    "English",
    "Malayalam",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("standard session size must be > 0")]
    InvalidStandardSize,

    #[error("exam needs at least one subject")]
    NoExamSubjects,

    #[error("exam questions per subject must be > 0")]
    InvalidQuestionsPerSubject,

    #[error("exam duration must be > 0 seconds")]
    InvalidExamDuration,

    #[error("per-question duration must be > 0 seconds")]
    InvalidQuestionDuration,
}

/// Sizing and timing rules for standard quizzes and full exams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    standard_session_size: usize,
    exam_subjects: Vec<String>,
    exam_questions_per_subject: usize,
    exam_duration_secs: u32,
    question_duration_secs: u32,
}

impl Default for QuizSettings {
    /// 15-question quizzes; a 150-question exam (30 per subject) over
    /// 2 hours 30 minutes with 60 seconds per question.
    fn default() -> Self {
        Self {
            standard_session_size: 15,
            exam_subjects: DEFAULT_EXAM_SUBJECTS.iter().map(|s| (*s).to_owned()).collect(),
            exam_questions_per_subject: 30,
            exam_duration_secs: 9_000,
            question_duration_secs: 60,
        }
    }
}

impl QuizSettings {
    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any size or duration is zero or no subject is given.
    pub fn new(
        standard_session_size: usize,
        exam_subjects: Vec<String>,
        exam_questions_per_subject: usize,
        exam_duration_secs: u32,
        question_duration_secs: u32,
    ) -> Result<Self, SettingsError> {
        if standard_session_size == 0 {
            return Err(SettingsError::InvalidStandardSize);
        }
        if exam_subjects.is_empty() {
            return Err(SettingsError::NoExamSubjects);
        }
        if exam_questions_per_subject == 0 {
            return Err(SettingsError::InvalidQuestionsPerSubject);
        }
        if exam_duration_secs == 0 {
            return Err(SettingsError::InvalidExamDuration);
        }
        if question_duration_secs == 0 {
            return Err(SettingsError::InvalidQuestionDuration);
        }

        Ok(Self {
            standard_session_size,
            exam_subjects,
            exam_questions_per_subject,
            exam_duration_secs,
            question_duration_secs,
        })
    }

    /// Defaults with overrides from `KTET_STANDARD_SIZE`,
    /// `KTET_EXAM_DURATION_SECS` and `KTET_QUESTION_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`. Unparsable or zero values are logged and ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(size) = parse_positive::<usize>(&lookup, "KTET_STANDARD_SIZE") {
            self.standard_session_size = size;
        }
        if let Some(secs) = parse_positive::<u32>(&lookup, "KTET_EXAM_DURATION_SECS") {
            self.exam_duration_secs = secs;
        }
        if let Some(secs) = parse_positive::<u32>(&lookup, "KTET_QUESTION_SECS") {
            self.question_duration_secs = secs;
        }
        self
    }

    #[must_use]
    pub fn standard_session_size(&self) -> usize {
        self.standard_session_size
    }

    #[must_use]
    pub fn exam_subjects(&self) -> &[String] {
        &self.exam_subjects
    }

    #[must_use]
    pub fn exam_questions_per_subject(&self) -> usize {
        self.exam_questions_per_subject
    }

    /// Minimum size of an assembled exam: every subject's full quota.
    #[must_use]
    pub fn exam_required_questions(&self) -> usize {
        self.exam_subjects.len() * self.exam_questions_per_subject
    }

    #[must_use]
    pub fn exam_duration_secs(&self) -> u32 {
        self.exam_duration_secs
    }

    #[must_use]
    pub fn question_duration_secs(&self) -> u32 {
        self.question_duration_secs
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Some(value),
        _ => {
            tracing::warn!("ignoring invalid {key}={raw:?}");
            None
        }
    }
}
