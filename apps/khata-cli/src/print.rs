//! # Print Surfaces
//!
//! Where a rendered document goes once laid out. The hand-off is one-way:
//! a surface receives the finished layout and never talks back to pricing
//! or storage.

use khata_core::RenderedDocument;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::error::CliResult;

/// Destination for a rendered document.
pub trait PrintSurface {
    fn present(&mut self, document: &RenderedDocument) -> CliResult<()>;
}

/// Writes the plain-text layout (or JSON) to any writer, stdout by default.
pub struct WriterSurface<W: Write> {
    out: W,
    json: bool,
}

impl WriterSurface<std::io::Stdout> {
    pub fn stdout(json: bool) -> Self {
        WriterSurface::new(std::io::stdout(), json)
    }
}

impl<W: Write> WriterSurface<W> {
    pub fn new(out: W, json: bool) -> Self {
        WriterSurface { out, json }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PrintSurface for WriterSurface<W> {
    fn present(&mut self, document: &RenderedDocument) -> CliResult<()> {
        let body = format_document(document, self.json)?;
        self.out.write_all(body.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Writes the layout to a file, replacing it if present.
pub struct FileSurface {
    path: PathBuf,
    json: bool,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        FileSurface {
            path: path.into(),
            json,
        }
    }
}

impl PrintSurface for FileSurface {
    fn present(&mut self, document: &RenderedDocument) -> CliResult<()> {
        let body = format_document(document, self.json)?;
        std::fs::write(&self.path, body)?;
        info!(path = %self.path.display(), number = %document.number, "Document written");
        Ok(())
    }
}

fn format_document(document: &RenderedDocument, json: bool) -> CliResult<String> {
    if json {
        let mut body = serde_json::to_string_pretty(document)
            .map_err(|e| crate::error::CliError::internal(e.to_string()))?;
        body.push('\n');
        Ok(body)
    } else {
        Ok(document.to_text())
    }
}
