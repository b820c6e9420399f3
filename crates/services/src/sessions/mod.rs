mod plan;
mod progress;
mod reporter;
mod service;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::SessionAssembler;
pub use progress::SessionProgress;
pub use reporter::{PersistenceHandle, PersistenceReport, ResultReporter};
pub use service::{
    AnswerRecord, FinishReason, QuizSession, SelectOutcome, SessionOutcome, SessionPhase,
    SessionStep, TickOutcome,
};
pub use timer::ExamTimer;
pub use workflow::QuizService;
