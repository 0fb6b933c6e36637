use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;

static CORPUS_DIR: Dir = include_dir!("src/corpus");

/// Target text used when the sentence pool is unavailable, so a session
/// always has a defined target.
pub const FALLBACK_SENTENCE: &str = "The quick brown fox jumps over the lazy dog.";

/// Supplies target sentences: one when a session loads, a new one on each
/// restart.
pub trait SentenceSource {
    fn next_sentence(&self) -> String;
}

#[derive(Deserialize, Clone, Debug)]
pub struct SentencePool {
    pub name: String,
    pub sentences: Vec<String>,
}

impl SentencePool {
    /// Load the embedded pool; a missing, unreadable, or empty corpus
    /// degrades to a single-entry pool around [`FALLBACK_SENTENCE`].
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(Self::fallback)
    }

    fn try_load() -> Option<Self> {
        let file = CORPUS_DIR.get_file("sentences.json")?;
        let text = file.contents_utf8()?;
        let pool: SentencePool = serde_json::from_str(text).ok()?;
        if pool.sentences.is_empty() {
            return None;
        }
        Some(pool)
    }

    pub fn fallback() -> Self {
        Self {
            name: String::from("fallback"),
            sentences: vec![String::from(FALLBACK_SENTENCE)],
        }
    }
}

impl SentenceSource for SentencePool {
    fn next_sentence(&self) -> String {
        let mut rng = rand::thread_rng();
        self.sentences
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| String::from(FALLBACK_SENTENCE))
    }
}

/// Fixed target text, used for the `--prompt` override.
pub struct FixedSentence {
    text: String,
}

impl FixedSentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SentenceSource for FixedSentence {
    fn next_sentence(&self) -> String {
        self.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_pool_loads() {
        let pool = SentencePool::load();
        assert_eq!(pool.name, "english");
        assert!(!pool.sentences.is_empty());
    }

    #[test]
    fn test_next_sentence_comes_from_pool() {
        let pool = SentencePool::load();
        for _ in 0..20 {
            let s = pool.next_sentence();
            assert!(pool.sentences.contains(&s));
        }
    }

    #[test]
    fn test_fallback_pool() {
        let pool = SentencePool::fallback();
        assert_eq!(pool.next_sentence(), FALLBACK_SENTENCE);
    }

    #[test]
    fn test_fixed_sentence_repeats() {
        let fixed = FixedSentence::new("hello there");
        assert_eq!(fixed.next_sentence(), "hello there");
        assert_eq!(fixed.next_sentence(), "hello there");
    }

    #[test]
    fn test_pool_deserialization() {
        let json = r#"{"name": "test", "sentences": ["one", "two"]}"#;
        let pool: SentencePool = serde_json::from_str(json).unwrap();
        assert_eq!(pool.name, "test");
        assert_eq!(pool.sentences.len(), 2);
    }
}
