use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::ai::{ChatClient, ExplanationService, QuestionGenerator};
use crate::bank::BankSource;
use crate::error::AppServicesError;
use crate::identity::Identity;
use crate::progress_service::ProgressService;
use crate::sessions::{QuizService, ResultReporter};
use crate::settings::QuizSettings;
use crate::shuffle::Shuffle;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
    progress: Arc<ProgressService>,
    explanations: Arc<ExplanationService>,
    generator: Arc<QuestionGenerator>,
    identity: Arc<dyn Identity>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the bank source is invalid or storage
    /// initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        bank: &str,
        clock: Clock,
        settings: QuizSettings,
        identity: Arc<dyn Identity>,
    ) -> Result<Self, AppServicesError> {
        let source = BankSource::parse(bank)?;
        let storage = Storage::sqlite(db_url).await?;
        tracing::debug!("storage ready at {db_url}, questions from {source}");
        Ok(Self::from_storage(
            &storage,
            source,
            clock,
            settings,
            identity,
            ChatClient::from_env(),
        ))
    }

    /// Build services over an existing storage backend.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        source: BankSource,
        clock: Clock,
        settings: QuizSettings,
        identity: Arc<dyn Identity>,
        chat: ChatClient,
    ) -> Self {
        let reporter = ResultReporter::new(
            clock,
            Arc::clone(&storage.history),
            Arc::clone(&storage.seen),
        );
        let quiz = Arc::new(QuizService::new(
            source,
            settings,
            Arc::clone(&identity),
            Arc::clone(&storage.seen),
            reporter,
        ));
        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.history),
            Arc::clone(&storage.seen),
        ));
        let explanations = Arc::new(ExplanationService::new(chat.clone()));
        let generator = Arc::new(QuestionGenerator::new(chat));

        Self {
            quiz,
            progress,
            explanations,
            generator,
            identity,
        }
    }

    /// Replace the question shuffle used for new sessions.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: Arc<dyn Shuffle>) -> Self {
        self.quiz = Arc::new(self.quiz.as_ref().clone().with_shuffle(shuffle));
        self
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn explanations(&self) -> Arc<ExplanationService> {
        Arc::clone(&self.explanations)
    }

    #[must_use]
    pub fn generator(&self) -> Arc<QuestionGenerator> {
        Arc::clone(&self.generator)
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn Identity> {
        Arc::clone(&self.identity)
    }
}
