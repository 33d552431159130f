//! Self-contained interactive HTML view.
//!
//! Each card carries its searchable fields as `data-*` attributes; the
//! embedded viewer script filters and sorts on those alone.

use std::collections::BTreeSet;
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::app::Result;
use crate::domain::display::{
    chapter_number, classify_tag, is_completed, language_flag, language_label, latest_chapter_text,
    score_text, status_text, time_ago, NO_IMAGE, UNKNOWN,
};
use crate::domain::{CollectionList, ComicEntry};

use super::{CollectionStats, ExportContext};

pub(crate) const STYLE: &str = include_str!("../../assets/style.css");
pub(crate) const VIEWER_JS: &str = include_str!("../../assets/viewer.js");

pub fn render_html(lists: &[CollectionList], ctx: &ExportContext) -> Result<String> {
    let mut out = String::new();
    write_head(&mut out, ctx)?;
    write_header(&mut out, lists, ctx, false)?;
    out.push_str("<main id=\"lists\">\n");
    write_sections(&mut out, lists, ctx)?;
    out.push_str("</main>\n");
    write!(out, "<script>\n{}\n</script>\n", VIEWER_JS)?;
    out.push_str("</body>\n</html>\n");
    Ok(out)
}

pub(crate) fn write_head(out: &mut String, ctx: &ExportContext) -> std::fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(
        out,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    )?;
    writeln!(
        out,
        "<title>{}'s Collection ({})</title>",
        text(&ctx.display_name),
        text(&ctx.export_date)
    )?;
    writeln!(out, "<style>\n{}\n</style>", STYLE)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")
}

/// Page heading, stats line and the filter controls. The editable variant
/// adds its toolbar.
pub(crate) fn write_header(
    out: &mut String,
    lists: &[CollectionList],
    ctx: &ExportContext,
    editable: bool,
) -> std::fmt::Result {
    let stats = CollectionStats::from_lists(lists);

    writeln!(out, "<header class=\"page-header\">")?;
    writeln!(out, "<h1>{}'s Collection</h1>", text(&ctx.display_name))?;
    writeln!(
        out,
        "<p class=\"stats\">{} lists ({} with comics) &middot; {} comics &middot; {} with reading history &middot; exported {}</p>",
        stats.lists,
        stats.non_empty_lists,
        stats.comics,
        stats.with_history,
        text(&ctx.export_date)
    )?;

    if editable {
        writeln!(out, "<div class=\"toolbar\">")?;
        writeln!(out, "<button type=\"button\" id=\"btn-add\">Add comic</button>")?;
        writeln!(out, "<button type=\"button\" id=\"btn-save\">Save HTML</button>")?;
        writeln!(out, "<button type=\"button\" id=\"btn-json\">Export JSON</button>")?;
        writeln!(out, "<span id=\"dirty\" hidden>Unsaved changes</span>")?;
        writeln!(out, "</div>")?;
    }

    writeln!(out, "<div class=\"controls\">")?;
    writeln!(
        out,
        "<input type=\"search\" id=\"search\" placeholder=\"Search titles, authors, tags\">"
    )?;

    writeln!(out, "<select id=\"filter-status\">")?;
    writeln!(out, "<option value=\"\">All statuses</option>")?;
    for status in distinct_statuses(lists) {
        writeln!(
            out,
            "<option value=\"{}\">{}</option>",
            attr(&status),
            text(&status)
        )?;
    }
    writeln!(out, "</select>")?;

    writeln!(out, "<select id=\"filter-lang\">")?;
    writeln!(out, "<option value=\"\">All types</option>")?;
    for label in ["Manhwa", "Manga", "Manhua", "Comic"] {
        writeln!(out, "<option value=\"{0}\">{0}</option>", label)?;
    }
    writeln!(out, "</select>")?;

    writeln!(out, "<select id=\"filter-read\">")?;
    writeln!(out, "<option value=\"\">Any progress</option>")?;
    writeln!(out, "<option value=\"read\">With reading history</option>")?;
    writeln!(out, "<option value=\"unread\">Never read</option>")?;
    writeln!(out, "</select>")?;

    writeln!(out, "<select id=\"sort\">")?;
    for (value, label) in [
        ("default", "List order"),
        ("title", "Title"),
        ("score", "Score"),
        ("chapters", "Latest chapter"),
        ("read", "Last read"),
        ("updated", "Last updated"),
    ] {
        writeln!(out, "<option value=\"{}\">{}</option>", value, label)?;
    }
    writeln!(out, "</select>")?;

    writeln!(
        out,
        "<button type=\"button\" id=\"clear-tag\" hidden>Tag: <span id=\"active-tag\"></span> &times;</button>"
    )?;
    writeln!(out, "<span id=\"visible-count\"></span>")?;
    writeln!(out, "</div>")?;
    writeln!(out, "</header>")
}

fn status_key(status: &str) -> String {
    status_text(status).trim().to_lowercase()
}

fn distinct_statuses(lists: &[CollectionList]) -> BTreeSet<String> {
    lists
        .iter()
        .flat_map(|l| &l.entries)
        .map(|e| status_key(&e.status))
        .collect()
}

/// One section per non-empty list, in list order.
pub(crate) fn write_sections(
    out: &mut String,
    lists: &[CollectionList],
    ctx: &ExportContext,
) -> std::fmt::Result {
    let mut order = 0;
    for list in lists.iter().filter(|l| !l.is_empty()) {
        writeln!(
            out,
            "<section class=\"list\" data-list=\"{}\">",
            attr(&list.name)
        )?;
        writeln!(
            out,
            "<h2>{} <span class=\"privacy\">{}</span> <span class=\"count\">{}</span></h2>",
            text(&list.name),
            list.privacy_label(),
            list.entries.len()
        )?;
        writeln!(out, "<div class=\"grid\">")?;
        for entry in &list.entries {
            write_card(out, list, entry, ctx, order)?;
            order += 1;
        }
        writeln!(out, "</div>")?;
        writeln!(out, "</section>")?;
    }
    Ok(())
}

fn number_attr(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_card(
    out: &mut String,
    list: &CollectionList,
    entry: &ComicEntry,
    ctx: &ExportContext,
    order: usize,
) -> std::fmt::Result {
    let read_ts = entry.history.as_ref().and_then(|h| h.read_timestamp);
    let latest = entry.latest_chapter_label.as_deref();
    let link = ctx.resolve(&entry.source_path);

    writeln!(
        out,
        "<article class=\"card\" data-id=\"{}\" data-order=\"{}\" data-title=\"{}\" data-authors=\"{}\" data-status=\"{}\" data-lang=\"{}\" data-tags=\"{}\" data-score=\"{}\" data-chapters=\"{}\" data-has-read=\"{}\" data-read=\"{}\" data-updated=\"{}\" data-list=\"{}\">",
        attr(&entry.id),
        order,
        attr(entry.display_title()),
        attr(&entry.authors.join(", ")),
        attr(&status_key(&entry.status)),
        language_label(&entry.origin_language),
        attr(&entry.genres.join("|")),
        number_attr(entry.average_score),
        number_attr(latest.and_then(chapter_number)),
        u8::from(entry.history.is_some()),
        read_ts.map(|t| t.to_string()).unwrap_or_default(),
        entry
            .last_updated_timestamp
            .map(|t| t.to_string())
            .unwrap_or_default(),
        attr(&list.name),
    )?;

    match entry.image_source() {
        Some(src) => {
            let src = if src.starts_with("data:") {
                src.to_string()
            } else {
                ctx.resolve(src)
            };
            writeln!(
                out,
                "<div class=\"cover\"><img src=\"{}\" alt=\"\" loading=\"lazy\"></div>",
                attr(&src)
            )?;
        }
        None => writeln!(out, "<div class=\"cover no-image\">{}</div>", NO_IMAGE)?,
    }

    writeln!(out, "<div class=\"info\">")?;
    if entry.source_path.is_empty() {
        writeln!(out, "<h3 class=\"title\">{}</h3>", text(entry.display_title()))?;
    } else {
        writeln!(
            out,
            "<h3 class=\"title\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></h3>",
            attr(&link),
            text(entry.display_title())
        )?;
    }

    let status_class = if is_completed(&entry.status) {
        "status-completed"
    } else {
        "status-ongoing"
    };
    writeln!(
        out,
        "<div class=\"meta\"><span class=\"lang\">{} {}</span> <span class=\"status {}\">{}</span> <span class=\"score\">&#9733; {}</span></div>",
        language_flag(&entry.origin_language),
        language_label(&entry.origin_language),
        status_class,
        text(status_text(&entry.status)),
        score_text(entry.average_score)
    )?;

    if !entry.authors.is_empty() {
        writeln!(
            out,
            "<div class=\"authors\">{}</div>",
            text(&entry.authors.join(", "))
        )?;
    }

    writeln!(
        out,
        "<div class=\"chapters\">Latest: {} &middot; Updated: {}</div>",
        text(&latest_chapter_text(latest).unwrap_or_else(|| UNKNOWN.to_string())),
        time_ago(entry.last_updated_timestamp, ctx.generated_at)
    )?;

    match &entry.history {
        Some(history) => writeln!(
            out,
            "<div class=\"progress\">Last read: {} ({})</div>",
            text(&history.chapter_label),
            time_ago(history.read_timestamp, ctx.generated_at)
        )?,
        None => writeln!(out, "<div class=\"progress\">Last read: -</div>")?,
    }

    if !entry.genres.is_empty() {
        out.push_str("<div class=\"tags\">");
        for genre in &entry.genres {
            write!(
                out,
                "<span class=\"{}\" data-tag=\"{}\">{}</span>",
                classify_tag(genre).css_class(),
                attr(genre),
                text(genre)
            )?;
        }
        out.push_str("</div>\n");
    }

    writeln!(out, "</div>")?;
    writeln!(out, "</article>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    #[test]
    fn test_empty_lists_have_no_section() {
        let html = render_html(&fixtures::scenario(), &fixtures::ctx()).unwrap();
        assert!(html.contains("data-list=\"A\">"));
        assert!(!html.contains("data-list=\"B\""));
        assert_eq!(html.matches("<article class=\"card\"").count(), 1);
    }

    #[test]
    fn test_card_attributes() {
        let html = render_html(&fixtures::rich(), &fixtures::ctx()).unwrap();
        assert!(html.contains("data-title=\"Tower of God\""));
        assert!(html.contains("data-status=\"ongoing\""));
        assert!(html.contains("data-lang=\"Manhwa\""));
        assert!(html.contains("data-tags=\"Action|Gore|Shounen\""));
        assert!(html.contains("data-score=\"8.72\""));
        assert!(html.contains("data-chapters=\"610\""));
        assert!(html.contains("data-read=\"1715000000000\""));
        assert!(html.contains("data-updated=\"1716000000000\""));
        assert!(html.contains("data-has-read=\"1\""));
    }

    #[test]
    fn test_tag_tiers_are_styling_only() {
        let html = render_html(&fixtures::rich(), &fixtures::ctx()).unwrap();
        assert!(html.contains("<span class=\"tag\" data-tag=\"Action\">Action</span>"));
        assert!(html.contains("<span class=\"tag-warn\" data-tag=\"Gore\">Gore</span>"));
        assert!(html.contains("<span class=\"tag-demo\" data-tag=\"Shounen\">Shounen</span>"));
        assert_eq!(html.matches("<article class=\"card\"").count(), 1);
    }

    #[test]
    fn test_text_is_escaped() {
        let mut lists = fixtures::rich();
        lists[0].entries[0].title = "<b>Bold</b> & \"quoted\"".into();
        let html = render_html(&lists, &fixtures::ctx()).unwrap();
        assert!(!html.contains("<b>Bold</b>"));
        assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt; &amp; \"quoted\""));
        assert!(html.contains("data-title=\"&lt;b&gt;Bold&lt;/b&gt; &amp; &quot;quoted&quot;\""));
    }

    #[test]
    fn test_display_placeholders() {
        let html = render_html(&fixtures::scenario(), &fixtures::ctx()).unwrap();
        assert!(html.contains("Latest: Ch.200"));
        assert!(html.contains("Updated: Unknown"));
        assert!(html.contains("Last read: -"));
        assert!(html.contains(NO_IMAGE));
        assert!(html.contains(">Unknown</span>"));
        assert!(html.contains("href=\"https://bato.to/title/c1-solo-leveling\""));
    }

    #[test]
    fn test_relative_cover_resolved_against_origin() {
        let html = render_html(&fixtures::rich(), &fixtures::ctx()).unwrap();
        assert!(html.contains("src=\"https://bato.to/covers/c9.jpg\""));
        assert!(html.contains("Last read: Chapter 598 (25d ago)"));
    }

    #[test]
    fn test_viewer_script_embedded() {
        let html = render_html(&[], &fixtures::ctx()).unwrap();
        assert!(html.contains("<script>"));
        assert!(html.contains("filter-status"));
        assert!(!html.contains("<section"));
    }
}
