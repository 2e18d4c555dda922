// Deterministic stand-ins for the external collaborators, shared by unit tests

use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::embeddings::Embedder;
use crate::generation::Generator;
use crate::loader::{Loader, PageRecord};
use crate::{AskError, Result};

const DIMENSION: usize = 1024;

/// Bag-of-words hashing embedder: texts sharing words get similar vectors
#[derive(Debug, Default)]
pub(crate) struct KeywordEmbedder {
    calls: AtomicUsize,
    exhausted: bool,
}

impl KeywordEmbedder {
    /// An embedder whose provider quota is used up
    pub(crate) fn exhausted() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            exhausted: true,
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

impl Embedder for KeywordEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.exhausted {
            return Err(AskError::RateLimit("429 Too Many Requests".to_string()));
        }
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn model(&self) -> &str {
        "keyword-test"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeneratorMode {
    /// Answer by quoting the best passage
    Quote,
    RateLimited,
    Broken,
}

/// Generator double that counts calls and remembers the last context
#[derive(Debug)]
pub(crate) struct StubGenerator {
    mode: Mutex<GeneratorMode>,
    calls: AtomicUsize,
    last_context: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub(crate) fn new(mode: GeneratorMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: AtomicUsize::new(0),
            last_context: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_mode(&self, mode: GeneratorMode) {
        *self.mode.lock().expect("mode lock") = mode;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_context(&self) -> Vec<String> {
        self.last_context.lock().expect("context lock").clone()
    }
}

impl Generator for StubGenerator {
    fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().expect("context lock") = context.to_vec();

        match *self.mode.lock().expect("mode lock") {
            GeneratorMode::Quote => Ok(format!(
                "Q: {} A: {}",
                question,
                context.first().map_or("I don't know.", String::as_str)
            )),
            GeneratorMode::RateLimited => Err(AskError::RateLimit(
                "429 Resource exhausted".to_string(),
            )),
            GeneratorMode::Broken => Err(AskError::Generation("connection reset".to_string())),
        }
    }

    fn model(&self) -> &str {
        "stub-generator"
    }
}

/// Reads the uploaded file as UTF-8 text, one page per form feed
#[derive(Debug, Default)]
pub(crate) struct TextLoader {
    last_path: Mutex<Option<PathBuf>>,
}

impl TextLoader {
    /// Path of the most recently loaded file
    pub(crate) fn last_path(&self) -> Option<PathBuf> {
        self.last_path.lock().expect("path lock").clone()
    }
}

impl Loader for TextLoader {
    fn load(&self, path: &Path) -> Result<Vec<PageRecord>> {
        *self.last_path.lock().expect("path lock") = Some(path.to_path_buf());
        let bytes = std::fs::read(path).map_err(|e| AskError::Load(e.to_string()))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| AskError::Load("not a readable document".to_string()))?;

        Ok(text
            .split('\x0c')
            .enumerate()
            .map(|(i, page)| PageRecord::new(i as u32 + 1, page))
            .collect())
    }
}
