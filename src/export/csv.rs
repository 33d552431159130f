//! Flat CSV table, one row per comic across all lists.

use crate::domain::display::{
    date_only, language_label, last_read_chapter, latest_chapter_text, score_text, PLACEHOLDER,
};
use crate::domain::{CollectionList, ComicEntry};

use super::ExportContext;

const BOM: &str = "\u{feff}";
const LINE_END: &str = "\r\n";

fn header(ctx: &ExportContext) -> Vec<String> {
    [
        "List Name",
        "Privacy",
        "Comic Name",
        "Lang",
        "Score",
        "Status",
        "Last Read Ch",
        "Last Read Date",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(format!("Latest Ch (As of {})", ctx.export_date)))
    .chain(
        ["Updated", "Genres", "Authors", "Source URL", "Comic ID"]
            .iter()
            .map(|s| s.to_string()),
    )
    .collect()
}

/// Quote a field only when it has to be quoted.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn row(list: &CollectionList, entry: &ComicEntry, ctx: &ExportContext) -> Vec<String> {
    let source_url = if entry.source_path.is_empty() {
        String::new()
    } else {
        ctx.resolve(&entry.source_path)
    };

    vec![
        list.name.clone(),
        list.privacy_label().to_string(),
        entry.display_title().to_string(),
        language_label(&entry.origin_language).to_string(),
        score_text(entry.average_score),
        entry.status.clone(),
        last_read_chapter(entry).to_string(),
        date_only(entry.history.as_ref().and_then(|h| h.read_timestamp)),
        latest_chapter_text(entry.latest_chapter_label.as_deref())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        date_only(entry.last_updated_timestamp),
        entry.genres.join(", "),
        entry.authors.join(", "),
        source_url,
        entry.id.clone(),
    ]
}

fn join_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// UTF-8 CSV text with a leading byte-order mark and CRLF line endings.
pub fn render_csv(lists: &[CollectionList], ctx: &ExportContext) -> String {
    let mut lines = vec![join_row(&header(ctx))];
    for list in lists {
        for entry in &list.entries {
            lines.push(join_row(&row(list, entry, ctx)));
        }
    }

    let mut out = String::from(BOM);
    out.push_str(&lines.join(LINE_END));
    out.push_str(LINE_END);
    out
}
