pub mod commands;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};

use crate::domain::{EntryPatch, ReadHistory};
use crate::export::ExportFormat;

use self::commands::EditOp;

#[derive(Parser)]
#[command(name = "mylist-exporter")]
#[command(about = "Export a reading-list collection to HTML, PDF, CSV and JSON", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/mylist-exporter/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Don't print progress to stderr
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the collection and export it
    Export {
        /// Numeric user id of the collection owner
        #[arg(short, long)]
        user: String,

        /// Display name used in titles and filenames
        #[arg(short, long, default_value = "User")]
        name: String,

        #[command(flatten)]
        formats: FormatArgs,

        /// Download and embed cover images
        #[arg(long)]
        covers: bool,

        /// Output directory (default: from config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Open the first exported file when done
        #[arg(long)]
        open: bool,
    },
    /// Re-render a saved JSON snapshot or editable HTML without fetching
    Render {
        /// Snapshot file (.json or _editable.html)
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        formats: FormatArgs,

        /// Output directory (default: from config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Add, update or remove entries in a saved snapshot
    Edit {
        /// Snapshot file (.json or _editable.html), rewritten in place
        file: PathBuf,

        #[command(subcommand)]
        action: EditAction,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatArgs {
    /// Interactive HTML (default)
    #[arg(long)]
    pub html: bool,
    /// Editable HTML with the embedded dataset
    #[arg(long)]
    pub editable: bool,
    /// Printable PDF table
    #[arg(long)]
    pub pdf: bool,
    /// CSV spreadsheet
    #[arg(long)]
    pub csv: bool,
    /// JSON snapshot
    #[arg(long)]
    pub json: bool,
    /// Every format
    #[arg(long)]
    pub all: bool,
}

impl FormatArgs {
    /// Requested formats; plain HTML when nothing was asked for.
    pub fn selected(&self) -> Vec<ExportFormat> {
        if self.all {
            return ExportFormat::ALL.to_vec();
        }
        let selected: Vec<ExportFormat> = [
            (self.html, ExportFormat::Html),
            (self.editable, ExportFormat::EditableHtml),
            (self.pdf, ExportFormat::Pdf),
            (self.csv, ExportFormat::Csv),
            (self.json, ExportFormat::Json),
        ]
        .into_iter()
        .filter_map(|(on, format)| on.then_some(format))
        .collect();

        if selected.is_empty() {
            vec![ExportFormat::Html]
        } else {
            selected
        }
    }
}

#[derive(Subcommand)]
pub enum EditAction {
    /// Add a new entry
    Add {
        /// List to add to; created when missing
        #[arg(long)]
        list: String,

        #[command(flatten)]
        fields: EntryFields,
    },
    /// Change fields of an entry
    Update {
        /// Entry id
        id: String,

        /// Move the entry to this list
        #[arg(long)]
        list: Option<String>,

        #[command(flatten)]
        fields: EntryFields,
    },
    /// Remove an entry
    Remove {
        /// Entry id
        id: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct EntryFields {
    #[arg(long)]
    pub title: Option<String>,
    /// Origin language code (ko, ja, zh, en)
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    /// Comma separated
    #[arg(long)]
    pub genres: Option<String>,
    /// Comma separated
    #[arg(long)]
    pub authors: Option<String>,
    #[arg(long)]
    pub score: Option<f64>,
    /// Latest chapter label
    #[arg(long)]
    pub latest: Option<String>,
    #[arg(long)]
    pub source_path: Option<String>,
    #[arg(long)]
    pub cover_url: Option<String>,
    /// Last read chapter; records a read at the current time
    #[arg(long)]
    pub read_chapter: Option<String>,
}

fn split_names(value: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

impl EntryFields {
    pub fn into_patch(self, list: Option<String>) -> EntryPatch {
        EntryPatch {
            title: self.title,
            list,
            origin_language: self.lang,
            status: self.status,
            genres: self.genres.as_deref().map(split_names),
            authors: self.authors.as_deref().map(split_names),
            average_score: self.score,
            latest_chapter_label: self.latest,
            source_path: self.source_path,
            cover_url: self.cover_url,
            history: self.read_chapter.map(|chapter_label| ReadHistory {
                chapter_label,
                read_timestamp: Some(Utc::now().timestamp_millis()),
            }),
        }
    }
}

impl From<EditAction> for EditOp {
    fn from(action: EditAction) -> Self {
        match action {
            EditAction::Add { list, fields } => EditOp::Add {
                patch: fields.into_patch(None),
                list,
            },
            EditAction::Update { id, list, fields } => EditOp::Update {
                id,
                patch: fields.into_patch(list),
            },
            EditAction::Remove { id } => EditOp::Remove { id },
        }
    }
}
