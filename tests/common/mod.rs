// Helpers shared by the integration test binaries

#![allow(
    dead_code,
    reason = "each test binary compiles this module but uses a subset of it"
)]

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use askdocs::embeddings::{Embedder, SlidingWindowChunker};
use askdocs::generation::Generator;
use askdocs::index::IndexProvider;
use askdocs::loader::PdfLoader;
use askdocs::session::Pipeline;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Build a PDF with one page per entry; each line of an entry is drawn separately.
/// `None` produces a page without any text.
pub fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        if let Some(text) = text {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            operations.push(Operation::new("TL", vec![12.into()]));
            operations.push(Operation::new("Td", vec![40.into(), 800.into()]));
            for line in text.lines() {
                operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf should serialize");
    bytes
}

/// "The capital of France is Paris." repeated well past one chunk, a few sentences per line
pub fn france_text() -> String {
    vec!["The capital of France is Paris. The capital of France is Paris."; 12].join("\n")
}

/// Bag-of-words hashing embedder; no network involved
#[derive(Debug, Default)]
pub struct WordEmbedder {
    calls: AtomicUsize,
}

impl WordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this embedder assigns to `text`
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; 512];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % 512) as usize] += 1.0;
        }
        vector
    }
}

impl Embedder for WordEmbedder {
    fn embed_documents(&self, texts: &[String]) -> askdocs::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> askdocs::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn model(&self) -> &str {
        "word-hash"
    }
}

/// Records the context it is given and answers from the first passage that mentions Paris
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    calls: AtomicUsize,
    contexts: Mutex<Vec<Vec<String>>>,
}

impl RecordingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn contexts(&self) -> Vec<Vec<String>> {
        self.contexts.lock().expect("context lock").clone()
    }
}

impl Generator for RecordingGenerator {
    fn generate(&self, _question: &str, context: &[String]) -> askdocs::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts
            .lock()
            .expect("context lock")
            .push(context.to_vec());

        Ok(if context.iter().any(|c| c.contains("Paris")) {
            "The capital of France is Paris.".to_string()
        } else {
            "I don't know.".to_string()
        })
    }

    fn model(&self) -> &str {
        "recording"
    }
}

/// Real PDF loading and chunking with in-process embedding and generation
pub fn offline_pipeline(
    embedder: Arc<WordEmbedder>,
    generator: Arc<RecordingGenerator>,
    indexes: IndexProvider,
) -> Pipeline {
    Pipeline::new(
        Arc::new(PdfLoader::new()),
        Arc::new(SlidingWindowChunker::default()),
        embedder,
        generator,
        indexes,
        4,
    )
}
