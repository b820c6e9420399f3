use std::collections::HashSet;
use std::sync::Arc;

use ktet_core::model::{Question, QuestionBank, QuestionId};

use crate::error::AssemblyError;
use crate::settings::QuizSettings;
use crate::shuffle::{RandomShuffle, Shuffle};

/// Builds the ordered question list for one session.
#[derive(Clone)]
pub struct SessionAssembler {
    settings: QuizSettings,
    shuffle: Arc<dyn Shuffle>,
}

impl SessionAssembler {
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self {
            settings,
            shuffle: Arc::new(RandomShuffle),
        }
    }

    /// Replace the shuffle strategy.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: Arc<dyn Shuffle>) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Build a standard session for `category`.
    ///
    /// Unseen questions are preferred. Once every question in the category
    /// has been seen the whole category is drawn from again. The result holds
    /// at most `standard_session_size` questions, fewer when the pool is smaller.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::CategoryNotFound` if the category is absent or empty.
    pub fn build_standard(
        &self,
        bank: &QuestionBank,
        category: &str,
        seen: &HashSet<QuestionId>,
    ) -> Result<Vec<Question>, AssemblyError> {
        let questions = bank
            .category(category)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AssemblyError::CategoryNotFound(category.to_owned()))?
            .questions();

        let unseen: Vec<Question> = questions
            .iter()
            .filter(|q| !seen.contains(q.id()))
            .cloned()
            .collect();

        let pool = if unseen.is_empty() {
            tracing::debug!("every question in {category} was seen; recycling the category");
            questions.to_vec()
        } else {
            unseen
        };

        Ok(self.draw(pool, self.settings.standard_session_size()))
    }

    /// Build a full exam: a fixed quota from every exam subject, interleaved.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::MissingSubject` if any subject category is absent,
    /// or `AssemblyError::InsufficientQuestions` if the combined draw falls short
    /// of every subject's full quota.
    pub fn build_exam(&self, bank: &QuestionBank) -> Result<Vec<Question>, AssemblyError> {
        let per_subject = self.settings.exam_questions_per_subject();
        let mut combined = Vec::with_capacity(self.settings.exam_required_questions());

        for subject in self.settings.exam_subjects() {
            let category = bank
                .category(subject)
                .ok_or_else(|| AssemblyError::MissingSubject(subject.clone()))?;
            combined.extend(self.draw(category.questions().to_vec(), per_subject));
        }

        let required = self.settings.exam_required_questions();
        if combined.len() < required {
            return Err(AssemblyError::InsufficientQuestions {
                found: combined.len(),
                required,
            });
        }

        self.shuffle.shuffle(&mut combined);
        Ok(combined)
    }

    fn draw(&self, mut pool: Vec<Question>, take: usize) -> Vec<Question> {
        self.shuffle.shuffle(&mut pool);
        pool.truncate(take);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ktet_core::model::{Category, QuestionDraft};

    fn question(id: &str) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            question: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: 0,
            explanation: String::new(),
        }
        .validate()
        .unwrap()
    }

    fn category(name: &str, prefix: &str, n: usize) -> Category {
        Category::new(
            name,
            (0..n).map(|i| question(&format!("{prefix}-{i}"))).collect(),
        )
    }

    fn exam_bank(per_subject: usize) -> QuestionBank {
        QuestionBank::new(vec![
            category("Child Development & Pedagogy", "cdp", per_subject),
            category("Mathematics", "math", per_subject),
            category("Science", "sci", per_subject),
            category("English", "eng", per_subject),
            category("Malayalam", "mal", per_subject),
        ])
    }

    fn identity() -> Arc<dyn Shuffle> {
        Arc::new(|_: &mut [Question]| {})
    }

    fn assembler() -> SessionAssembler {
        SessionAssembler::new(QuizSettings::default())
    }

    #[test]
    fn standard_session_is_capped_and_distinct() {
        let bank = QuestionBank::new(vec![category("Science", "sci", 40)]);
        let session = assembler()
            .build_standard(&bank, "Science", &HashSet::new())
            .unwrap();

        assert_eq!(session.len(), 15);
        let distinct: HashSet<_> = session.iter().map(|q| q.id().clone()).collect();
        assert_eq!(distinct.len(), 15);
        assert!(session.iter().all(|q| q.id().as_str().starts_with("sci-")));
    }

    #[test]
    fn small_category_yields_short_session() {
        let bank = QuestionBank::new(vec![category("Mathematics", "math", 5)]);
        let session = assembler()
            .build_standard(&bank, "Mathematics", &HashSet::new())
            .unwrap();
        assert_eq!(session.len(), 5);
    }

    #[test]
    fn seen_questions_are_skipped_while_unseen_remain() {
        let bank = QuestionBank::new(vec![category("English", "eng", 20)]);
        let seen: HashSet<QuestionId> = (0..18)
            .map(|i| QuestionId::new(format!("eng-{i}")))
            .collect();

        let session = assembler().build_standard(&bank, "English", &seen).unwrap();

        let ids: HashSet<&str> = session.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, HashSet::from(["eng-18", "eng-19"]));
    }

    #[test]
    fn fully_seen_category_recycles() {
        let bank = QuestionBank::new(vec![category("English", "eng", 20)]);
        let seen: HashSet<QuestionId> = (0..20)
            .map(|i| QuestionId::new(format!("eng-{i}")))
            .collect();

        let session = assembler().build_standard(&bank, "English", &seen).unwrap();
        assert_eq!(session.len(), 15);
    }

    #[test]
    fn missing_or_empty_category_is_not_found() {
        let bank = QuestionBank::new(vec![Category::new("Science", Vec::new())]);
        for name in ["Science", "Geography"] {
            let err = assembler()
                .build_standard(&bank, name, &HashSet::new())
                .unwrap_err();
            assert_eq!(err, AssemblyError::CategoryNotFound(name.to_owned()));
        }
    }

    #[test]
    fn standard_draw_uses_injected_shuffle() {
        let bank = QuestionBank::new(vec![category("Science", "sci", 3)]);
        let reverse: Arc<dyn Shuffle> = Arc::new(|qs: &mut [Question]| qs.reverse());
        let session = assembler()
            .with_shuffle(reverse)
            .build_standard(&bank, "Science", &HashSet::new())
            .unwrap();
        let ids: Vec<&str> = session.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, vec!["sci-2", "sci-1", "sci-0"]);
    }

    #[test]
    fn exam_draws_thirty_from_each_subject() {
        let bank = exam_bank(45);
        let exam = assembler().build_exam(&bank).unwrap();

        assert_eq!(exam.len(), 150);
        for prefix in ["cdp-", "math-", "sci-", "eng-", "mal-"] {
            let count = exam
                .iter()
                .filter(|q| q.id().as_str().starts_with(prefix))
                .count();
            assert_eq!(count, 30, "subject {prefix}");
        }
    }

    #[test]
    fn exam_fails_when_a_subject_is_missing() {
        let mut categories = exam_bank(30).categories().to_vec();
        categories.retain(|c| c.name() != "Malayalam");
        let bank = QuestionBank::new(categories);

        let err = assembler().build_exam(&bank).unwrap_err();
        assert_eq!(err, AssemblyError::MissingSubject("Malayalam".into()));
    }

    #[test]
    fn exam_fails_when_a_subject_is_short() {
        let mut categories = exam_bank(30).categories().to_vec();
        categories.retain(|c| c.name() != "Science");
        categories.push(category("Science", "sci", 12));
        let bank = QuestionBank::new(categories);

        let err = assembler().build_exam(&bank).unwrap_err();
        assert_eq!(
            err,
            AssemblyError::InsufficientQuestions {
                found: 132,
                required: 150
            }
        );
    }

    #[test]
    fn exam_interleaves_with_a_final_shuffle() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting: Arc<dyn Shuffle> = Arc::new(move |_: &mut [Question]| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let exam = assembler()
            .with_shuffle(counting)
            .build_exam(&exam_bank(30))
            .unwrap();

        assert_eq!(exam.len(), 150);
        // one draw per subject plus the combined shuffle
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 6);
    }

    #[test]
    fn identity_shuffle_keeps_subject_blocks() {
        let exam = assembler()
            .with_shuffle(identity())
            .build_exam(&exam_bank(31))
            .unwrap();
        assert_eq!(exam[0].id().as_str(), "cdp-0");
        assert_eq!(exam[30].id().as_str(), "math-0");
        assert_eq!(exam[149].id().as_str(), "mal-29");
    }
}
