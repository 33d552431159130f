//! Editable HTML: the interactive view plus the snapshot it was rendered
//! from and a client that edits that snapshot in the browser.
//!
//! The embedded `<script type="application/json" id="dataset">` block is the
//! same format as the JSON export, so a saved document can be fed back to
//! `render` or `edit`.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::app::{ExportError, Result};
use crate::domain::{CollectionList, Snapshot};

use super::html::{write_head, write_header, write_sections, VIEWER_JS};
use super::ExportContext;

const EDITOR_JS: &str = include_str!("../../assets/editor.js");
const DATASET_OPEN: &str = "<script type=\"application/json\" id=\"dataset\">";
const SCRIPT_CLOSE: &str = "</script>";

pub fn render_editable_html(lists: &[CollectionList], ctx: &ExportContext) -> Result<String> {
    let snapshot = ctx.snapshot(lists);
    let origin = ctx.origin.as_ref().map(|o| o.to_string()).unwrap_or_default();

    let mut out = String::new();
    write_head(&mut out, ctx)?;
    write_header(&mut out, lists, ctx, true)?;
    writeln!(out, "<main id=\"lists\" data-origin=\"{}\">", attr(&origin))?;
    write_sections(&mut out, lists, ctx)?;
    out.push_str("</main>\n");
    write_dialog(&mut out, lists)?;
    writeln!(out, "{}{}{}", DATASET_OPEN, embed_json(&snapshot)?, SCRIPT_CLOSE)?;
    write!(out, "<script>\n{}\n</script>\n", VIEWER_JS)?;
    write!(out, "<script>\n{}\n</script>\n", EDITOR_JS)?;
    out.push_str("</body>\n</html>\n");
    Ok(out)
}

/// Compact JSON safe to place inside a `<script>` element.
pub fn embed_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string(snapshot)?.replace('<', "\\u003c"))
}

/// Read back the snapshot embedded in an editable document.
pub fn extract_snapshot(html: &str) -> Result<Snapshot> {
    let start = html
        .find(DATASET_OPEN)
        .map(|i| i + DATASET_OPEN.len())
        .ok_or_else(|| ExportError::Dataset("no embedded dataset found".into()))?;
    let len = html[start..]
        .find(SCRIPT_CLOSE)
        .ok_or_else(|| ExportError::Dataset("unterminated embedded dataset".into()))?;
    Snapshot::from_json(&html[start..start + len])
}

fn write_dialog(out: &mut String, lists: &[CollectionList]) -> std::fmt::Result {
    writeln!(out, "<datalist id=\"list-names\">")?;
    for list in lists {
        writeln!(out, "<option value=\"{}\"></option>", attr(&list.name))?;
    }
    writeln!(out, "</datalist>")?;

    writeln!(out, "<dialog id=\"entry-dialog\">")?;
    writeln!(out, "<form method=\"dialog\" id=\"entry-form\">")?;
    writeln!(out, "<input type=\"hidden\" name=\"id\">")?;
    for (name, label, kind) in [
        ("title", "Title", "text"),
        ("list", "List", "text"),
        ("status", "Status", "text"),
        ("score", "Score", "number"),
        ("latest", "Latest chapter", "text"),
        ("readChapter", "Last read chapter", "text"),
        ("genres", "Genres (comma separated)", "text"),
        ("authors", "Authors (comma separated)", "text"),
        ("sourcePath", "Source path", "text"),
        ("coverUrl", "Cover URL", "text"),
    ] {
        let extra = match name {
            "title" => " required",
            "list" => " list=\"list-names\" required",
            "score" => " step=\"0.1\" min=\"0\" max=\"10\"",
            _ => "",
        };
        writeln!(
            out,
            "<label for=\"f-{0}\">{1}</label><input id=\"f-{0}\" name=\"{0}\" type=\"{2}\"{3}>",
            name,
            text(label),
            kind,
            extra
        )?;
    }
    writeln!(out, "<label for=\"f-lang\">Origin</label>")?;
    writeln!(out, "<select id=\"f-lang\" name=\"lang\">")?;
    for (code, label) in [
        ("ko", "Manhwa (ko)"),
        ("ja", "Manga (ja)"),
        ("zh", "Manhua (zh)"),
        ("en", "Comic (en)"),
        ("", "Other"),
    ] {
        writeln!(out, "<option value=\"{}\">{}</option>", code, label)?;
    }
    writeln!(out, "</select>")?;
    writeln!(out, "<div class=\"actions\">")?;
    writeln!(out, "<button type=\"button\" id=\"entry-cancel\">Cancel</button>")?;
    writeln!(out, "<button type=\"submit\" id=\"entry-submit\">Save</button>")?;
    writeln!(out, "</div>")?;
    writeln!(out, "</form>")?;
    writeln!(out, "</dialog>")
}
