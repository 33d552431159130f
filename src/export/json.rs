use crate::app::Result;
use crate::domain::CollectionList;

use super::ExportContext;

/// Pretty-printed snapshot. This is the re-importable form of an export.
pub fn render_json(lists: &[CollectionList], ctx: &ExportContext) -> Result<String> {
    ctx.snapshot(lists).to_json_pretty()
}
