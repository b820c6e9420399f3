use std::collections::HashSet;
use std::sync::Arc;

use ktet_core::model::{QuestionBank, QuestionId};
use reqwest::Client;
use storage::repository::SeenQuestionsRepository;

use super::plan::SessionAssembler;
use super::reporter::{PersistenceHandle, ResultReporter};
use super::service::{QuizSession, SessionStep, TickOutcome};
use crate::bank::BankSource;
use crate::error::{BankLoadError, SessionError};
use crate::identity::Identity;
use crate::settings::QuizSettings;
use crate::shuffle::Shuffle;

/// Orchestrates session start and hands finished sessions to the reporter.
#[derive(Clone)]
pub struct QuizService {
    source: BankSource,
    client: Client,
    identity: Arc<dyn Identity>,
    seen: Arc<dyn SeenQuestionsRepository>,
    reporter: ResultReporter,
    assembler: SessionAssembler,
}

impl QuizService {
    #[must_use]
    pub fn new(
        source: BankSource,
        settings: QuizSettings,
        identity: Arc<dyn Identity>,
        seen: Arc<dyn SeenQuestionsRepository>,
        reporter: ResultReporter,
    ) -> Self {
        Self {
            source,
            client: Client::new(),
            identity,
            seen,
            reporter,
            assembler: SessionAssembler::new(settings),
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: Arc<dyn Shuffle>) -> Self {
        self.assembler = self.assembler.with_shuffle(shuffle);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        self.assembler.settings()
    }

    /// Fetch the question bank from the configured source.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError` if the bank cannot be fetched or parsed.
    pub async fn load_bank(&self) -> Result<QuestionBank, BankLoadError> {
        self.source.load(&self.client).await
    }

    /// Load the bank and start a standard session for `category`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the bank fails to load or the category has no questions.
    pub async fn start_standard(&self, category: &str) -> Result<QuizSession, SessionError> {
        let bank = self.load_bank().await?;
        self.start_standard_with_bank(&bank, category).await
    }

    /// Start a standard session from an already loaded bank.
    ///
    /// Signed-in users get unseen questions first. A failed seen lookup is
    /// logged and treated as an empty seen set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the category has no questions.
    pub async fn start_standard_with_bank(
        &self,
        bank: &QuestionBank,
        category: &str,
    ) -> Result<QuizSession, SessionError> {
        let seen = self.seen_for(category).await;
        let questions = self.assembler.build_standard(bank, category, &seen)?;
        tracing::info!(
            "starting {category} quiz with {} questions ({} previously seen)",
            questions.len(),
            seen.len()
        );
        QuizSession::standard(category, questions)
    }

    /// Load the bank and assemble a full exam. The exam waits for `QuizSession::start`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the bank fails to load or any subject is short.
    pub async fn start_exam(&self) -> Result<QuizSession, SessionError> {
        let bank = self.load_bank().await?;
        self.start_exam_with_bank(&bank)
    }

    /// Assemble a full exam from an already loaded bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if any exam subject is missing or short.
    pub fn start_exam_with_bank(&self, bank: &QuestionBank) -> Result<QuizSession, SessionError> {
        let questions = self.assembler.build_exam(bank)?;
        tracing::info!("starting exam with {} questions", questions.len());
        QuizSession::exam(questions, self.settings())
    }

    /// Advance the session and report it if this step finished it.
    ///
    /// # Errors
    ///
    /// Returns the `SessionError` from `QuizSession::advance`.
    pub fn advance(
        &self,
        session: &mut QuizSession,
    ) -> Result<(SessionStep, Option<PersistenceHandle>), SessionError> {
        let step = session.advance()?;
        Ok((step, self.complete(session)))
    }

    /// Feed elapsed seconds into the session and report it if the timers finished it.
    pub fn tick(
        &self,
        session: &mut QuizSession,
        elapsed_secs: u32,
    ) -> (TickOutcome, Option<PersistenceHandle>) {
        let outcome = session.on_tick(elapsed_secs);
        (outcome, self.complete(session))
    }

    /// Report a finished session exactly once.
    ///
    /// Returns `None` while the session is still running, when it was already
    /// reported, or when nobody is signed in.
    pub fn complete(&self, session: &mut QuizSession) -> Option<PersistenceHandle> {
        if session.is_reported() {
            return None;
        }
        let outcome = session.outcome()?;
        session.mark_reported();

        tracing::info!(
            "{} finished: {}/{} ({}%)",
            outcome.category,
            outcome.score,
            outcome.total,
            outcome.grade.percentage
        );
        self.reporter.report(outcome, self.identity.current_user_id())
    }

    async fn seen_for(&self, category: &str) -> HashSet<QuestionId> {
        let Some(user) = self.identity.current_user_id() else {
            return HashSet::new();
        };
        match self.seen.get_seen(&user, category).await {
            Ok(ids) => ids.into_iter().collect(),
            Err(err) => {
                tracing::warn!("could not load seen questions for {user}; using none: {err}");
                HashSet::new()
            }
        }
    }
}
