#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Loading and chunking of generated PDFs

mod common;

use std::path::PathBuf;

use askdocs::embeddings::{Chunker, ChunkingConfig, SlidingWindowChunker};
use askdocs::loader::{Loader, PdfLoader};
use common::{build_pdf, france_text};
use tempfile::TempDir;

fn write_pdf(dir: &TempDir, name: &str, pages: &[Option<&str>]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, build_pdf(pages)).expect("should write pdf");
    path
}

#[test]
fn same_pdf_always_yields_same_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let text = france_text();
    let path = write_pdf(&temp_dir, "france.pdf", &[Some(&text), Some(&text)]);
    let chunker = SlidingWindowChunker::default();

    let first = chunker.chunk(&PdfLoader::new().load(&path).expect("pdf should load"));
    let second = chunker.chunk(&PdfLoader::new().load(&path).expect("pdf should load"));

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn windows_are_bounded_and_overlap_within_a_page() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let text = france_text();
    let path = write_pdf(&temp_dir, "france.pdf", &[Some(&text), Some("Short page.")]);

    let pages = PdfLoader::new().load(&path).expect("pdf should load");
    let chunks = SlidingWindowChunker::new(&ChunkingConfig::default()).chunk(&pages);

    assert!(chunks.iter().all(|c| c.char_len() <= 500));
    assert!(chunks.iter().any(|c| c.page_number == 2));

    let first_page: Vec<_> = chunks.iter().filter(|c| c.page_number == 1).collect();
    assert!(first_page.len() >= 2);
    for pair in first_page.windows(2) {
        let previous: Vec<char> = pair[0].content.chars().collect();
        let next: Vec<char> = pair[1].content.chars().collect();
        assert_eq!(pair[1].start_offset - pair[0].start_offset, 400);
        assert_eq!(previous[400..], next[..100]);
    }

    // indices run across the whole document
    for (position, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, position);
    }
}

#[test]
fn blank_pages_produce_no_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let path = write_pdf(&temp_dir, "scan.pdf", &[None, None, None]);

    let pages = PdfLoader::new().load(&path).expect("pdf should load");

    assert_eq!(pages.len(), 3);
    assert!(SlidingWindowChunker::default().chunk(&pages).is_empty());
}
