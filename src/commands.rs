use anyhow::{Context, Result, bail};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::chat::{Chat, read_upload, render_answer, render_notice};
use crate::config::Config;
use crate::session::{Pipeline, Reply, Session};

/// Start the interactive chat, optionally with a PDF already loaded
#[inline]
pub async fn chat(config: &Config, pdf: Option<PathBuf>) -> Result<()> {
    let pipeline = Pipeline::from_config(config).context("Failed to set up the pipeline")?;
    info!("Starting chat with {:?}", pipeline);

    let mut chat = Chat::new(pipeline);
    let mut stdout = std::io::stdout();

    if let Some(path) = pdf {
        chat.upload_path(&path, &mut stdout).await?;
    }

    chat.run(BufReader::new(std::io::stdin()), &mut stdout).await
}

/// Answer a single question about a PDF and print the answer with its source pages
#[inline]
pub async fn ask(config: &Config, pdf: &Path, question: &str) -> Result<()> {
    let pipeline = Pipeline::from_config(config).context("Failed to set up the pipeline")?;
    let upload = read_upload(pdf)?;
    let mut session = Session::new();

    for notice in session.upload(&pipeline, upload).await {
        eprintln!("{}", render_notice(&notice));
    }
    if !session.state().is_ready() {
        bail!("Could not process {}", pdf.display());
    }

    match session.ask(question).await {
        Reply::Answered(answer) => {
            println!("{}", render_answer(&answer));
            Ok(())
        }
        Reply::Notice(notice) => bail!("{}", notice.text),
        Reply::Ignored => bail!("The question is empty"),
    }
}
