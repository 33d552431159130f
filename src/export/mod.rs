//! Output formats.
//!
//! Every generator is a pure function of the merged lists and an
//! [`ExportContext`]; none of them touch the network or the filesystem.
//! [`generate_all`] builds every requested artifact in memory first and
//! [`write_artifacts`] only runs once all of them succeeded.

pub mod csv;
pub mod editable;
pub mod html;
pub mod json;
pub mod pdf;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use url::Url;

use crate::app::Result;
use crate::config::Config;
use crate::domain::{CollectionList, Snapshot};

use self::pdf::metrics::UnicodeFont;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Html,
    EditableHtml,
    Pdf,
    Csv,
    Json,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Html,
        ExportFormat::EditableHtml,
        ExportFormat::Pdf,
        ExportFormat::Csv,
        ExportFormat::Json,
    ];

    /// Filename tail after `<tag>_export_<user>_<date>`.
    pub fn suffix(self) -> &'static str {
        match self {
            ExportFormat::Html => ".html",
            ExportFormat::EditableHtml => "_editable.html",
            ExportFormat::Pdf => ".pdf",
            ExportFormat::Csv => ".csv",
            ExportFormat::Json => ".json",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Html | ExportFormat::EditableHtml => "text/html",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// Configured rendering inputs shared by `export`, `render` and `edit`.
#[derive(Debug, Clone, Default)]
pub struct RenderSettings {
    pub origin: Option<Url>,
    pub pdf_font: Option<Arc<UnicodeFont>>,
}

impl RenderSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let origin = Url::parse(&config.source.origin)?;
        let pdf_font = match &config.output.pdf_font {
            Some(path) => {
                let font = UnicodeFont::load(path)?;
                tracing::debug!("Loaded PDF font {} from {}", font.name(), path.display());
                Some(Arc::new(font))
            }
            None => None,
        };
        Ok(Self {
            origin: Some(origin),
            pdf_font,
        })
    }
}

/// Everything a generator needs besides the lists themselves.
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Short site tag used as filename prefix and snapshot source.
    pub source_tag: String,
    pub display_name: String,
    /// `YYYY-MM-DD`, shown in headers and filenames.
    pub export_date: String,
    /// Reference instant for relative times.
    pub generated_at: DateTime<Utc>,
    /// Site origin that relative source and cover paths resolve against.
    pub origin: Option<Url>,
    /// Draw cover thumbnails in the PDF.
    pub include_covers: bool,
    /// Font for PDF text outside WinAnsi.
    pub pdf_font: Option<Arc<UnicodeFont>>,
}

impl ExportContext {
    pub fn new(
        source_tag: impl Into<String>,
        display_name: impl Into<String>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source_tag: source_tag.into(),
            display_name: display_name.into(),
            export_date: generated_at.format("%Y-%m-%d").to_string(),
            generated_at,
            origin: None,
            include_covers: false,
            pdf_font: None,
        }
    }

    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_settings(mut self, settings: &RenderSettings) -> Self {
        if let Some(origin) = &settings.origin {
            self.origin = Some(origin.clone());
        }
        self.pdf_font = settings.pdf_font.clone();
        self
    }

    pub fn with_covers(mut self, include_covers: bool) -> Self {
        self.include_covers = include_covers;
        self
    }

    /// Context for re-rendering a saved snapshot.
    pub fn from_snapshot(snapshot: &Snapshot, generated_at: DateTime<Utc>) -> Self {
        let mut ctx = Self::new(&snapshot.source, &snapshot.display_name, generated_at);
        if !snapshot.export_date.is_empty() {
            ctx.export_date = snapshot.export_date.clone();
        }
        if ctx.source_tag.is_empty() {
            ctx.source_tag = "mylist".to_string();
        }
        ctx
    }

    pub fn snapshot(&self, lists: &[CollectionList]) -> Snapshot {
        Snapshot::new(
            &self.source_tag,
            &self.display_name,
            &self.export_date,
            lists.to_vec(),
        )
    }

    /// Absolute form of a site path. Already absolute URLs pass through.
    pub fn resolve(&self, path: &str) -> String {
        match &self.origin {
            Some(origin) => origin
                .join(path)
                .map(String::from)
                .unwrap_or_else(|_| path.to_string()),
            None => path.to_string(),
        }
    }
}

/// Header counts shown by the HTML and PDF documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub lists: usize,
    pub non_empty_lists: usize,
    pub comics: usize,
    pub with_history: usize,
}

impl CollectionStats {
    pub fn from_lists(lists: &[CollectionList]) -> Self {
        let entries = lists.iter().flat_map(|l| &l.entries);
        Self {
            lists: lists.len(),
            non_empty_lists: lists.iter().filter(|l| !l.is_empty()).count(),
            comics: entries.clone().count(),
            with_history: entries.filter(|e| e.history.is_some()).count(),
        }
    }
}

/// One generated output file, still in memory.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub format: ExportFormat,
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Replace characters that are unsafe in filenames.
pub fn sanitize_filename_part(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "User".to_string()
    } else {
        cleaned
    }
}

pub fn artifact_filename(ctx: &ExportContext, format: ExportFormat) -> String {
    format!(
        "{}_export_{}_{}{}",
        ctx.source_tag,
        sanitize_filename_part(&ctx.display_name),
        ctx.export_date,
        format.suffix()
    )
}

pub fn generate(
    format: ExportFormat,
    lists: &[CollectionList],
    ctx: &ExportContext,
) -> Result<Artifact> {
    let bytes = match format {
        ExportFormat::Html => html::render_html(lists, ctx)?.into_bytes(),
        ExportFormat::EditableHtml => editable::render_editable_html(lists, ctx)?.into_bytes(),
        ExportFormat::Pdf => pdf::render_pdf(lists, ctx)?,
        ExportFormat::Csv => self::csv::render_csv(lists, ctx).into_bytes(),
        ExportFormat::Json => json::render_json(lists, ctx)?.into_bytes(),
    };
    tracing::debug!("Generated {:?}: {} bytes", format, bytes.len());

    Ok(Artifact {
        format,
        filename: artifact_filename(ctx, format),
        mime: format.mime(),
        bytes,
    })
}

/// Generate every requested format. Fails as a whole if any generator fails.
pub fn generate_all(
    formats: &[ExportFormat],
    lists: &[CollectionList],
    ctx: &ExportContext,
) -> Result<Vec<Artifact>> {
    formats
        .iter()
        .map(|format| generate(*format, lists, ctx))
        .collect()
}

pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(&artifact.filename);
        fs::write(&path, &artifact.bytes)?;
        tracing::info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
        written.push(path);
    }
    Ok(written)
}
