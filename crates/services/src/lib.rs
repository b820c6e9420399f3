#![forbid(unsafe_code)]

pub mod ai;
pub mod app_services;
pub mod bank;
pub mod error;
pub mod identity;
pub mod progress_service;
pub mod sessions;
pub mod settings;
pub mod shuffle;

pub use ktet_core::Clock;

pub use app_services::AppServices;
pub use bank::BankSource;
pub use error::{
    AiError, AppServicesError, AssemblyError, BankLoadError, PersistenceError, ProgressError,
    SessionError,
};
pub use identity::{Identity, StaticIdentity};
pub use progress_service::{ProgressService, SeenCategory};
pub use settings::{QuizSettings, SettingsError};
pub use shuffle::{RandomShuffle, SeededShuffle, Shuffle};

pub use sessions::{
    AnswerRecord, ExamTimer, FinishReason, PersistenceHandle, PersistenceReport, QuizService,
    QuizSession, ResultReporter, SelectOutcome, SessionAssembler, SessionOutcome, SessionPhase,
    SessionProgress, SessionStep, TickOutcome,
};
