use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::model::ids::QuestionId;

/// Per-user record of the questions already completed in standard mode.
///
/// Grows through `mark_seen`; only `reset_category` removes entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenQuestions {
    by_category: BTreeMap<String, BTreeSet<QuestionId>>,
}

impl SeenQuestions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids seen in `category`; empty when the category has no progress.
    #[must_use]
    pub fn ids_for(&self, category: &str) -> HashSet<QuestionId> {
        self.by_category
            .get(category)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn count_for(&self, category: &str) -> usize {
        self.by_category.get(category).map_or(0, BTreeSet::len)
    }

    /// Union `ids` into the category's seen set.
    pub fn mark_seen<I>(&mut self, category: &str, ids: I)
    where
        I: IntoIterator<Item = QuestionId>,
    {
        self.by_category
            .entry(category.to_owned())
            .or_default()
            .extend(ids);
    }

    /// Clear progress for a category. Returns the number of ids removed.
    pub fn reset_category(&mut self, category: &str) -> usize {
        self.by_category.remove(category).map_or(0, |ids| ids.len())
    }

    /// Categories with at least one seen question, sorted by name.
    #[must_use]
    pub fn categories_with_progress(&self) -> Vec<&str> {
        self.by_category
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
