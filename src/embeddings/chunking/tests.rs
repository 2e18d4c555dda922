use super::*;

fn chunker(chunk_size: usize, chunk_overlap: usize) -> SlidingWindowChunker {
    SlidingWindowChunker::new(&ChunkingConfig {
        chunk_size,
        chunk_overlap,
    })
}

fn alphabet_page(len: usize) -> PageRecord {
    let text: String = ('a'..='z').cycle().take(len).collect();
    PageRecord::new(1, text)
}

#[test]
fn default_window() {
    let chunker = SlidingWindowChunker::default();
    assert_eq!(chunker.chunk_size, 500);
    assert_eq!(chunker.chunk_overlap, 100);
    assert_eq!(chunker.stride(), 400);
}

#[test]
fn short_page_is_single_chunk() {
    let chunks = SlidingWindowChunker::default().chunk(&[PageRecord::new(3, "Short page.")]);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Short page.");
    assert_eq!(chunks[0].page_number, 3);
    assert_eq!(chunks[0].start_offset, 0);
}

#[test]
fn windows_are_bounded_and_overlap() {
    let page = alphabet_page(1_100);
    let chunks = SlidingWindowChunker::default().chunk(std::slice::from_ref(&page));

    // starts at 0, 400, 800; the third window reaches the end of the text
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.char_len() <= 500));
    assert_eq!(chunks[0].char_len(), 500);
    assert_eq!(chunks[2].char_len(), 300);

    for pair in chunks.windows(2) {
        let previous: Vec<char> = pair[0].content.chars().collect();
        let next: Vec<char> = pair[1].content.chars().collect();
        assert_eq!(&previous[previous.len() - 100..], &next[..100]);
        assert_eq!(pair[1].start_offset - pair[0].start_offset, 400);
    }

    let last = chunks.last().expect("chunks should not be empty");
    assert!(page.text.ends_with(&last.content));
}

#[test]
fn exact_window_length_yields_one_chunk() {
    let chunks = SlidingWindowChunker::default().chunk(&[alphabet_page(500)]);
    assert_eq!(chunks.len(), 1);
}

#[test]
fn no_overlap_across_pages() {
    let pages = vec![
        PageRecord::new(1, "a".repeat(450)),
        PageRecord::new(2, "b".repeat(450)),
    ];
    let chunks = SlidingWindowChunker::default().chunk(&pages);

    assert_eq!(chunks.len(), 2);
    assert!(chunks[0].content.chars().all(|c| c == 'a'));
    assert!(chunks[1].content.chars().all(|c| c == 'b'));
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[1].chunk_index, 1);
    assert_eq!(chunks[1].page_number, 2);
}

#[test]
fn blank_pages_produce_nothing() {
    let pages = vec![PageRecord::new(1, ""), PageRecord::new(2, "  \n ")];
    assert!(SlidingWindowChunker::default().chunk(&pages).is_empty());
    assert!(SlidingWindowChunker::default().chunk(&[]).is_empty());
}

#[test]
fn deterministic_output() {
    let pages = vec![alphabet_page(2_000), PageRecord::new(2, "tail page")];
    let chunker = SlidingWindowChunker::default();

    let first = chunker.chunk(&pages);
    let second = chunker.chunk(&pages);

    assert_eq!(first, second);
}

#[test]
fn multibyte_text_is_split_on_char_boundaries() {
    let page = PageRecord::new(1, "é🦀ü".repeat(10));
    let chunks = chunker(7, 2).chunk(&[page]);

    assert!(chunks.len() > 1);
    assert!(chunks.iter().all(|c| c.char_len() <= 7));
    assert_eq!(chunks[0].content, "é🦀üé🦀üé");
}

#[test]
fn overlap_is_clamped_below_window() {
    let chunker = chunker(10, 50);
    assert_eq!(chunker.stride(), 1);
}

#[test]
fn ids_depend_on_position() {
    let page = PageRecord::new(1, "x".repeat(900));
    let chunks = SlidingWindowChunker::default().chunk(&[page]);

    // identical windows at different offsets still get different ids
    assert_eq!(chunks[0].content, chunks[1].content);
    assert_ne!(chunks[0].id, chunks[1].id);
}
