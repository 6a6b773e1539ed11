use serde::{Deserialize, Serialize};

/// Default merge budget used when a caller does not provide one.
pub const DEFAULT_VOCAB_SIZE: usize = 1000;

/// Training configuration.
///
/// `vocab_size` bounds `|vocabulary| + |merges|`. Special tokens are kept out
/// of the training statistics and receive ids after the learned vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub vocab_size: usize,
    pub specials: Vec<String>,
    pub show_progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            vocab_size: DEFAULT_VOCAB_SIZE,
            specials: Vec::new(),
            show_progress: false,
        }
    }
}

impl TrainConfig {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            ..Self::default()
        }
    }

    pub fn with_specials<I, S>(mut self, specials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specials = specials.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}
