#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end sessions over real PDFs: lopdf loading and sliding-window chunking,
// with embedding and generation done in process

mod common;

use std::sync::Arc;

use askdocs::AskError;
use askdocs::index::IndexProvider;
use askdocs::session::{
    NO_TEXT_FOUND, Notice, NoticeLevel, Reply, Role, Session, SessionState, UPLOAD_FIRST, Upload,
};
use common::{RecordingGenerator, WordEmbedder, build_pdf, france_text, offline_pipeline};

fn france_upload() -> Upload {
    Upload::new("france.pdf", build_pdf(&[Some(&france_text())]))
}

/// Upload a PDF about France, ask for its capital, get Paris back
#[tokio::test]
async fn capital_of_france_end_to_end() {
    let embedder = Arc::new(WordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = offline_pipeline(
        Arc::clone(&embedder),
        Arc::clone(&generator),
        IndexProvider::Memory,
    );
    let mut session = Session::new();

    let notices = session.upload(&pipeline, france_upload()).await;
    assert_eq!(
        notices,
        vec![Notice::success("Ready! You are now chatting with: france.pdf")]
    );

    let document = session.document().expect("document should be ready");
    assert_eq!(document.pages, 1);
    assert!(document.chunks >= 2, "text exceeds one window");

    let reply = session.ask("What is the capital of France?").await;
    let Reply::Answered(answer) = reply else {
        panic!("expected an answer, got {:?}", reply);
    };

    assert!(answer.text.contains("Paris"));
    assert!(answer.sources.iter().all(|s| s.chunk.page_number == 1));

    let contexts = generator.contexts();
    assert_eq!(contexts.len(), 1);
    assert!(!contexts[0].is_empty());
    assert!(contexts[0].len() <= 4);
    assert!(contexts[0].iter().any(|passage| passage.contains("Paris")));
    assert!(contexts[0].iter().all(|passage| passage.chars().count() <= 500));

    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[0].role, Role::User);
    assert_eq!(session.history()[1].role, Role::Assistant);
}

#[tokio::test]
async fn image_only_pdf_reports_no_text() {
    let embedder = Arc::new(WordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = offline_pipeline(
        Arc::clone(&embedder),
        Arc::clone(&generator),
        IndexProvider::Memory,
    );
    let mut session = Session::new();

    let notices = session
        .upload(&pipeline, Upload::new("scan.pdf", build_pdf(&[None, None])))
        .await;

    assert_eq!(notices, vec![Notice::error(NO_TEXT_FOUND)]);
    assert!(matches!(
        session.state(),
        SessionState::Failed {
            error: AskError::EmptyContent,
            ..
        }
    ));
    assert_eq!(embedder.calls(), 0, "nothing may be embedded");

    let reply = session.ask("What does it say?").await;
    assert_eq!(reply, Reply::Notice(Notice::warning(UPLOAD_FIRST)));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn not_a_pdf_is_a_load_failure() {
    let pipeline = offline_pipeline(
        Arc::new(WordEmbedder::default()),
        Arc::new(RecordingGenerator::default()),
        IndexProvider::Memory,
    );
    let mut session = Session::new();

    let notices = session
        .upload(
            &pipeline,
            Upload::new("notes.pdf", b"just some text, not a PDF".to_vec()),
        )
        .await;

    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].text.starts_with("Could not read notes.pdf"));
    assert!(matches!(
        session.state(),
        SessionState::Failed {
            error: AskError::Load(_),
            ..
        }
    ));
}

#[tokio::test]
async fn switching_documents_rebuilds_and_resets_conversation() {
    let embedder = Arc::new(WordEmbedder::default());
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = offline_pipeline(
        Arc::clone(&embedder),
        Arc::clone(&generator),
        IndexProvider::Memory,
    );
    let mut session = Session::new();

    session.upload(&pipeline, france_upload()).await;
    session.ask("What is the capital of France?").await;

    // same name: nothing is reprocessed
    let embed_calls = embedder.calls();
    session.upload(&pipeline, france_upload()).await;
    assert_eq!(session.rebuilds(), 1);
    assert_eq!(embedder.calls(), embed_calls);
    assert_eq!(session.history().len(), 2);

    let other = Upload::new(
        "rivers.pdf",
        build_pdf(&[
            Some("The Danube flows into the Black Sea."),
            Some("The Rhine flows into the North Sea."),
        ]),
    );
    session.upload(&pipeline, other).await;

    assert_eq!(session.rebuilds(), 2);
    assert!(session.history().is_empty());
    assert_eq!(session.document().map(|d| d.pages), Some(2));

    let Reply::Answered(answer) = session.ask("Where does the Rhine flow?").await else {
        panic!("expected an answer");
    };
    assert_eq!(answer.text, "I don't know.");
    assert_eq!(answer.sources[0].chunk.page_number, 2);
}

#[tokio::test]
async fn sessions_are_independent() {
    let pipeline = offline_pipeline(
        Arc::new(WordEmbedder::default()),
        Arc::new(RecordingGenerator::default()),
        IndexProvider::Memory,
    );
    let mut first = Session::new();
    let mut second = Session::new();

    first.upload(&pipeline, france_upload()).await;

    assert!(first.state().is_ready());
    assert!(matches!(second.state(), SessionState::NoDocument));
    assert_eq!(
        second.ask("What is the capital of France?").await,
        Reply::Notice(Notice::warning(UPLOAD_FIRST))
    );
    assert!(first.history().is_empty());
}
