use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::app::{AppContext, ExportError, Result};
use crate::domain::{EditableDataset, EntryPatch, Snapshot};
use crate::export::editable::{extract_snapshot, render_editable_html};
use crate::export::{generate_all, write_artifacts, ExportContext, ExportFormat, RenderSettings};
use crate::fetcher::Progress;
use crate::merge::attach_history;

/// Progress lines go to stderr unless quiet.
pub fn progress_printer(quiet: bool) -> Progress {
    if quiet {
        crate::fetcher::silent_progress()
    } else {
        Arc::new(|msg: &str| eprintln!("{}", msg))
    }
}

pub struct ExportRequest {
    pub user_id: String,
    pub display_name: String,
    pub formats: Vec<ExportFormat>,
    pub covers: bool,
    pub out_dir: PathBuf,
}

/// Fetch, merge, optionally enrich, then generate and write every format.
///
/// Returns the written paths; empty when the user has no lists.
pub async fn export(
    ctx: &AppContext,
    request: &ExportRequest,
    progress: &Progress,
) -> Result<Vec<PathBuf>> {
    require_formats(&request.formats)?;

    progress("Fetching lists...");
    let lists = ctx
        .fetcher
        .fetch_all_lists(&request.user_id, progress)
        .await?;
    if lists.is_empty() {
        progress("No lists found.");
        return Ok(Vec::new());
    }

    progress("Fetching reading history...");
    let history = ctx.fetcher.fetch_history_index(progress).await?;
    let mut merged = attach_history(&lists, &history);
    tracing::info!(
        "Merged {} lists with {} history records",
        merged.len(),
        history.len()
    );

    if request.covers {
        merged = ctx.covers.enrich_covers(merged, progress).await;
    }

    progress("Generating files...");
    let export_ctx = ExportContext::new(
        &ctx.config.source.tag,
        &request.display_name,
        Utc::now(),
    )
    .with_settings(&ctx.settings)
    .with_covers(request.covers);

    let artifacts = generate_all(&request.formats, &merged, &export_ctx)?;
    let written = write_artifacts(&request.out_dir, &artifacts)?;
    progress(&format!(
        "Done: {} file(s) written to {}",
        written.len(),
        request.out_dir.display()
    ));
    Ok(written)
}

/// Read a JSON snapshot or the dataset embedded in an editable HTML file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path)?;
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('<') {
        extract_snapshot(trimmed)
    } else {
        Snapshot::from_json(trimmed)
    }
}

fn require_formats(formats: &[ExportFormat]) -> Result<()> {
    if formats.is_empty() {
        return Err(ExportError::Other("Select a format.".into()));
    }
    Ok(())
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Re-run the generators on a saved snapshot.
pub fn render(
    input: &Path,
    formats: &[ExportFormat],
    out_dir: &Path,
    settings: &RenderSettings,
    progress: &Progress,
) -> Result<Vec<PathBuf>> {
    require_formats(formats)?;
    let snapshot = load_snapshot(input)?;
    progress(&format!(
        "Loaded {} lists ({} comics) from {}",
        snapshot.lists.len(),
        snapshot.entry_count(),
        input.display()
    ));

    let mut ctx = ExportContext::from_snapshot(&snapshot, Utc::now()).with_settings(settings);
    let has_covers = snapshot
        .lists
        .iter()
        .flat_map(|l| &l.entries)
        .any(|e| e.cover_data.is_some());
    ctx = ctx.with_covers(has_covers);

    let artifacts = generate_all(formats, &snapshot.lists, &ctx)?;
    let written = write_artifacts(out_dir, &artifacts)?;
    progress(&format!(
        "Done: {} file(s) written to {}",
        written.len(),
        out_dir.display()
    ));
    Ok(written)
}

pub enum EditOp {
    Add { list: String, patch: EntryPatch },
    Update { id: String, patch: EntryPatch },
    Remove { id: String },
}

/// Apply one mutation to a snapshot file and save it in the same format.
/// HTML output is re-rendered with `settings` so links stay absolute.
pub fn edit(path: &Path, op: EditOp, settings: &RenderSettings) -> Result<String> {
    let mut dataset = EditableDataset::from_snapshot(load_snapshot(path)?);

    let message = match op {
        EditOp::Add { list, patch } => {
            let id = dataset.add(&list, &patch)?;
            format!("Added {} to {}", id, list)
        }
        EditOp::Update { id, patch } => {
            dataset.edit(&id, &patch)?;
            format!("Updated {}", id)
        }
        EditOp::Remove { id } => {
            let removed = dataset.delete(&id)?;
            format!("Removed {} ({})", id, removed.display_title())
        }
    };

    let snapshot = dataset.into_snapshot();
    let content = if is_html(path) {
        let ctx = ExportContext::from_snapshot(&snapshot, Utc::now()).with_settings(settings);
        render_editable_html(&snapshot.lists, &ctx)?
    } else {
        snapshot.to_json_pretty()?
    };
    fs::write(path, content)?;
    tracing::info!("Saved {}", path.display());
    Ok(message)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;
    use crate::config::Config;
    use crate::domain::{CollectionList, ComicEntry};
    use crate::fetcher::mock::MockTransport;
    use crate::fetcher::silent_progress;

    fn list_page() -> Value {
        json!({"data": {"get_user_mylistList": {
            "paging": {"pages": 1},
            "items": [
                {"id": 1, "data": {"name": "A", "isPublic": true, "comicNodes": [
                    {"data": {"id": "c1", "name": "Solo Leveling", "origLang": "ko",
                              "chaps_normal": 200, "urlPath": "/title/c1",
                              "urlCover600": "/covers/c1.jpg"}}
                ]}},
                {"id": 2, "data": {"name": "B", "isPublic": false, "comicNodes": []}}
            ]
        }}})
    }

    fn history_page() -> Value {
        json!({"data": {"get_sser_myHistory": {
            "newStart": null,
            "items": [
                {"date": 1_700_000_000_000_i64, "comicNode": {"id": "c1"},
                 "chapterNode": {"data": {"dname": "Chapter 150"}}}
            ]
        }}})
    }

    fn context(mock: Arc<MockTransport>) -> AppContext {
        AppContext::with_transport(Config::default(), mock).unwrap()
    }

    fn request(out_dir: &Path, formats: Vec<ExportFormat>, covers: bool) -> ExportRequest {
        ExportRequest {
            user_id: "1234".into(),
            display_name: "Jane".into(),
            formats,
            covers,
            out_dir: out_dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_export_pipeline_writes_requested_files() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::with_responses(vec![list_page(), history_page()]));
        mock.add_asset("https://bato.to/covers/c1.jpg", &[0xFF, 0xD8, 0xFF, 0xD9]);

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let progress: Progress = Arc::new(move |m: &str| sink.lock().unwrap().push(m.to_string()));

        let written = export(
            &context(mock.clone()),
            &request(dir.path(), vec![ExportFormat::Json, ExportFormat::Csv], true),
            &progress,
        )
        .await
        .unwrap();

        assert_eq!(written.len(), 2);
        let json_path = written.iter().find(|p| is_json(p)).unwrap();
        let snapshot = load_snapshot(json_path).unwrap();
        let c1 = &snapshot.lists[0].entries[0];
        assert_eq!(c1.history.as_ref().unwrap().chapter_label, "Chapter 150");
        assert!(c1.cover_data.as_deref().unwrap().starts_with("data:image/jpeg;base64,"));
        assert_eq!(snapshot.lists.len(), 2);

        let posted = mock.posted();
        assert_eq!(posted.len(), 2);
        assert_eq!(posted[0]["variables"]["select"]["userId"], "1234");

        let lines = lines.lock().unwrap();
        assert_eq!(lines[0], "Fetching lists...");
        assert!(lines.contains(&"Fetching reading history...".to_string()));
        assert!(lines.contains(&"Generating files...".to_string()));
    }

    fn is_json(path: &Path) -> bool {
        path.extension().is_some_and(|e| e == "json")
    }

    #[tokio::test]
    async fn test_export_without_lists_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let empty = json!({"data": {"get_user_mylistList": {"paging": {"pages": 0}, "items": []}}});
        let mock = Arc::new(MockTransport::with_responses(vec![empty]));

        let written = export(
            &context(mock.clone()),
            &request(dir.path(), ExportFormat::ALL.to_vec(), false),
            &silent_progress(),
        )
        .await
        .unwrap();

        assert!(written.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(mock.posted().len(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_aborts_before_writing() {
        let dir = TempDir::new().unwrap();
        // No scripted history response: the second request fails.
        let mock = Arc::new(MockTransport::with_responses(vec![list_page()]));

        let result = export(
            &context(mock),
            &request(dir.path(), vec![ExportFormat::Html], false),
            &silent_progress(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_export_without_formats_does_not_fetch() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::with_responses(vec![list_page()]));

        let err = export(
            &context(mock.clone()),
            &request(dir.path(), Vec::new(), false),
            &silent_progress(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Select a format.");
        assert!(mock.posted().is_empty());
    }

    fn write_snapshot(dir: &Path) -> PathBuf {
        let mut list = CollectionList::new("1", "Reading", true);
        list.entries.push(ComicEntry::new("c1", "Solo Leveling"));
        let snapshot = Snapshot::new("bato", "Jane", "2024-06-01", vec![list]);
        let path = dir.join("snap.json");
        fs::write(&path, snapshot.to_json_pretty().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_render_from_snapshot_and_editable_html() {
        let dir = TempDir::new().unwrap();
        let input = write_snapshot(dir.path());
        let out = dir.path().join("out");

        let written = tokio_test::assert_ok!(render(
            &input,
            &[ExportFormat::EditableHtml, ExportFormat::Pdf],
            &out,
            &RenderSettings::default(),
            &silent_progress(),
        ));
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("bato_export_Jane_2024-06-01_editable.html"));

        let again = load_snapshot(&written[0]).unwrap();
        assert_eq!(again, load_snapshot(&input).unwrap());
    }

    #[test]
    fn test_edit_add_update_remove() {
        let dir = TempDir::new().unwrap();
        let path = write_snapshot(dir.path());

        let settings = RenderSettings::default();
        let message = edit(
            &path,
            EditOp::Add {
                list: "Plan to Read".into(),
                patch: EntryPatch {
                    title: Some("Omniscient Reader".into()),
                    ..EntryPatch::default()
                },
            },
            &settings,
        )
        .unwrap();
        assert!(message.starts_with("Added local-"));

        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.lists.len(), 2);
        let new_id = snapshot.lists[1].entries[0].id.clone();

        edit(
            &path,
            EditOp::Update {
                id: "c1".into(),
                patch: EntryPatch {
                    list: Some("Plan to Read".into()),
                    status: Some("completed".into()),
                    ..EntryPatch::default()
                },
            },
            &settings,
        )
        .unwrap();
        let snapshot = load_snapshot(&path).unwrap();
        assert!(snapshot.lists[0].entries.is_empty());
        assert_eq!(snapshot.lists[1].entries[1].id, "c1");
        assert_eq!(snapshot.lists[1].entries[1].status, "completed");

        edit(&path, EditOp::Remove { id: new_id }, &settings).unwrap();
        assert_eq!(load_snapshot(&path).unwrap().entry_count(), 1);

        let missing = edit(&path, EditOp::Remove { id: "nope".into() }, &settings);
        assert!(missing.is_err());
    }

    #[test]
    fn test_edit_keeps_html_format() {
        let dir = TempDir::new().unwrap();
        let mut list = CollectionList::new("1", "Reading", true);
        let mut entry = ComicEntry::new("c1", "Solo Leveling");
        entry.source_path = "/title/c1".into();
        list.entries.push(entry);
        list.entries.push(ComicEntry::new("c2", "Omniscient Reader"));
        let snapshot = Snapshot::new("bato", "Jane", "2024-06-01", vec![list]);

        let settings = RenderSettings::from_config(&Config::default()).unwrap();
        let html = dir.path().join("snap_editable.html");
        let ctx = ExportContext::from_snapshot(&snapshot, Utc::now()).with_settings(&settings);
        fs::write(&html, render_editable_html(&snapshot.lists, &ctx).unwrap()).unwrap();

        edit(&html, EditOp::Remove { id: "c2".into() }, &settings).unwrap();

        let content = fs::read_to_string(&html).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(content.contains("data-origin=\"https://bato.to/\""));
        assert!(content.contains("href=\"https://bato.to/title/c1\""));
        assert_eq!(load_snapshot(&html).unwrap().entry_count(), 1);
    }
}
