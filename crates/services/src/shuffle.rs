use std::sync::Mutex;

use ktet_core::model::Question;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Permutation strategy used when drawing questions.
///
/// Any `Fn(&mut [Question])` closure is a strategy, which lets tests supply a
/// deterministic permutation.
pub trait Shuffle: Send + Sync {
    fn shuffle(&self, questions: &mut [Question]);
}

impl<F> Shuffle for F
where
    F: Fn(&mut [Question]) + Send + Sync,
{
    fn shuffle(&self, questions: &mut [Question]) {
        self(questions);
    }
}

/// Uniform shuffle backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomShuffle;

impl Shuffle for RandomShuffle {
    fn shuffle(&self, questions: &mut [Question]) {
        let mut rng = rand::rng();
        questions.shuffle(&mut rng);
    }
}

/// Uniform shuffle from a seeded RNG, reproducible across runs.
#[derive(Debug)]
pub struct SeededShuffle {
    rng: Mutex<StdRng>,
}

impl SeededShuffle {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Shuffle for SeededShuffle {
    fn shuffle(&self, questions: &mut [Question]) {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        questions.shuffle(&mut *rng);
    }
}
