// Interactive terminal chat over a session


use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::generation::Answer;
use crate::session::{Notice, NoticeLevel, Pipeline, Reply, Role, Session, Upload};

const HELP: &str = "\
Type a question about the loaded PDF and press Enter.

Commands:
  /upload <path>  load a PDF (a different file starts a new conversation)
  /history        show the conversation so far
  /help           show this message
  /exit           leave (also: exit, quit, Ctrl-D)";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Upload(PathBuf),
    History,
    Help,
    Exit,
    Empty,
    /// A slash command that is not recognised, or `/upload` without a path
    Invalid(String),
}

#[inline]
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Command::Exit;
    }

    let Some(command) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "upload" if !argument.is_empty() => Command::Upload(PathBuf::from(argument)),
        "upload" => Command::Invalid("Usage: /upload <path to PDF>".to_string()),
        "history" => Command::History,
        "help" => Command::Help,
        "exit" | "quit" => Command::Exit,
        other => Command::Invalid(format!("Unknown command: /{} (try /help)", other)),
    }
}

/// Read a PDF from disk into an upload named after the file
#[inline]
pub fn read_upload(path: &Path) -> Result<Upload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} does not name a file", path.display()))?;

    Ok(Upload::new(filename, bytes))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Terminal front end: owns one session and renders its notices and answers
#[derive(Debug)]
pub struct Chat {
    pipeline: Pipeline,
    session: Session,
}

impl Chat {
    #[inline]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            session: Session::new(),
        }
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Upload a PDF from disk and print the outcome
    #[inline]
    pub async fn upload_path<W: Write + Send>(
        &mut self,
        path: &Path,
        out: &mut W,
    ) -> Result<()> {
        let upload = match read_upload(path) {
            Ok(upload) => upload,
            Err(e) => {
                writeln!(out, "{}", render_notice(&Notice::error(format!("{:#}", e))))?;
                return Ok(());
            }
        };

        let bar = spinner(format!("Processing {}...", upload.filename));
        let notices = self.session.upload(&self.pipeline, upload).await;
        bar.finish_and_clear();

        for notice in &notices {
            writeln!(out, "{}", render_notice(notice))?;
        }
        Ok(())
    }

    #[inline]
    pub async fn handle_line<W: Write + Send>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<Flow> {
        match parse_line(line) {
            Command::Empty => {}
            Command::Exit => return Ok(Flow::Exit),
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Invalid(message) => {
                writeln!(out, "{}", render_notice(&Notice::warning(message)))?;
            }
            Command::Upload(path) => self.upload_path(&path, out).await?,
            Command::History => self.print_history(out)?,
            Command::Ask(question) => {
                let bar = spinner("Thinking...".to_string());
                let reply = self.session.ask(&question).await;
                bar.finish_and_clear();

                match reply {
                    Reply::Answered(answer) => writeln!(out, "{}", render_answer(&answer))?,
                    Reply::Notice(notice) => writeln!(out, "{}", render_notice(&notice))?,
                    Reply::Ignored => {}
                }
            }
        }

        out.flush()?;
        Ok(Flow::Continue)
    }

    /// Read lines until `/exit` or end of input
    #[inline]
    pub async fn run<R, W>(&mut self, mut input: R, out: &mut W) -> Result<()>
    where
        R: BufRead + Send,
        W: Write + Send,
    {
        writeln!(
            out,
            "{}",
            style("askdocs: chat with a PDF. Type /help for commands.")
                .bold()
                .cyan()
        )?;

        loop {
            write!(out, "{} ", style(">").bold().green())?;
            out.flush()?;

            let mut line = String::new();
            if input
                .read_line(&mut line)
                .context("Failed to read input")?
                == 0
            {
                debug!("End of input, leaving chat");
                writeln!(out)?;
                break;
            }

            if self.handle_line(&line, out).await? == Flow::Exit {
                break;
            }
        }

        writeln!(out, "Bye!")?;
        Ok(())
    }

    fn print_history<W: Write>(&self, out: &mut W) -> Result<()> {
        let history = self.session.history();
        if history.is_empty() {
            writeln!(out, "{}", style("No messages yet.").dim())?;
            return Ok(());
        }

        for message in history {
            let speaker = match message.role {
                Role::User => style("You").bold().green(),
                Role::Assistant => style("Assistant").bold().cyan(),
            };
            writeln!(out, "{}: {}", speaker, message.content)?;
        }
        Ok(())
    }
}

#[inline]
pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("{}", style(&notice.text).dim()),
        NoticeLevel::Success => {
            format!("{} {}", style("✓").green(), style(&notice.text).green())
        }
        NoticeLevel::Warning => {
            format!("{} {}", style("⚠").yellow(), style(&notice.text).yellow())
        }
        NoticeLevel::Error => format!("{} {}", style("✗").red(), style(&notice.text).red()),
    }
}

#[inline]
pub fn render_answer(answer: &Answer) -> String {
    let pages = answer.pages();
    if pages.is_empty() {
        return answer.text.clone();
    }

    let pages: Vec<String> = pages.iter().map(u32::to_string).collect();
    format!(
        "{}\n{}",
        answer.text,
        style(format!("Sources: page {}", pages.join(", "))).dim()
    )
}

fn spinner(message: String) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner().with_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
