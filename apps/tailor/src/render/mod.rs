// Document Rendering
// Turns the accepted candidate's markdown into the final deliverable.
// HTML is rendered in-process; PDF is produced by piping that HTML through an
// external converter found on PATH.

pub mod style;

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use style::RESUME_CSS;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no PDF converter found on PATH (tried: {tried}); install one or pass --format html")]
    ConverterMissing { tried: String },

    #[error("{program} exited with {status}: {stderr}")]
    ConverterFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} produced an empty document")]
    EmptyOutput { program: String },

    #[error("converter I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Html,
    Pdf,
}

/// Bytes of a rendered document plus the file extension it should be saved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, markup: &str) -> Result<RenderedDocument, RenderError>;
}

/// Builds the renderer for the requested format.
pub fn renderer_for(format: OutputFormat) -> Box<dyn DocumentRenderer> {
    match format {
        OutputFormat::Html => Box::new(HtmlRenderer),
        OutputFormat::Pdf => Box::new(PdfRenderer::default()),
    }
}

/// Standalone HTML page with the resume stylesheet inlined.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

#[async_trait]
impl DocumentRenderer for HtmlRenderer {
    async fn render(&self, markup: &str) -> Result<RenderedDocument, RenderError> {
        Ok(RenderedDocument {
            bytes: to_html_document(markup).into_bytes(),
            extension: "html",
        })
    }
}

/// Converts markdown to a full HTML document.
///
/// Single newlines inside a paragraph become `<br />`, so contact lines and
/// stacked role/date lines keep their layout.
pub fn to_html_document(markup: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;

    let events: Vec<Event> = Parser::new_ext(markup, options)
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect();

    let title = first_heading(&events).unwrap_or_else(|| "Resume".to_string());

    let mut body = String::with_capacity(markup.len() * 2);
    html::push_html(&mut body, events.into_iter());

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_text(&title),
        RESUME_CSS,
        body
    )
}

fn first_heading(events: &[Event]) -> Option<String> {
    let start = events.iter().position(|e| {
        matches!(
            e,
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            })
        )
    })?;

    let text: String = events[start + 1..]
        .iter()
        .take_while(|e| !matches!(e, Event::End(TagEnd::Heading(_))))
        .filter_map(|e| match e {
            Event::Text(t) | Event::Code(t) => Some(t.as_ref()),
            _ => None,
        })
        .collect();

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A command-line HTML→PDF converter that reads HTML on stdin and writes PDF to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    pub program: String,
    pub args: Vec<String>,
}

impl Converter {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Known converters in preference order.
pub fn default_converters() -> Vec<Converter> {
    vec![
        Converter::new("weasyprint", &["--encoding", "utf-8", "-", "-"]),
        Converter::new("wkhtmltopdf", &["--quiet", "--encoding", "utf-8", "-", "-"]),
    ]
}

pub struct PdfRenderer {
    converters: Vec<Converter>,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::with_converters(default_converters())
    }
}

impl PdfRenderer {
    pub fn with_converters(converters: Vec<Converter>) -> Self {
        Self { converters }
    }

    /// First converter whose program resolves on PATH.
    fn locate(&self) -> Result<(&Converter, PathBuf), RenderError> {
        self.converters
            .iter()
            .find_map(|c| which::which(&c.program).ok().map(|path| (c, path)))
            .ok_or_else(|| RenderError::ConverterMissing {
                tried: self
                    .converters
                    .iter()
                    .map(|c| c.program.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[async_trait]
impl DocumentRenderer for PdfRenderer {
    async fn render(&self, markup: &str) -> Result<RenderedDocument, RenderError> {
        let (converter, path) = self.locate()?;
        let html = to_html_document(markup);
        debug!(program = %path.display(), html_bytes = html.len(), "Converting HTML to PDF");

        let mut child = tokio::process::Command::new(&path)
            .args(&converter.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::ConverterFailed {
                program: converter.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(RenderError::EmptyOutput {
                program: converter.program.clone(),
            });
        }

        info!(
            program = %converter.program,
            bytes = output.stdout.len(),
            "PDF rendered"
        );
        Ok(RenderedDocument {
            bytes: output.stdout,
            extension: "pdf",
        })
    }
}
