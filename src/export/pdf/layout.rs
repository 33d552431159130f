//! Table layout for the printable document.
//!
//! Produces pages of positioned drawing operations. Coordinates are in
//! points with the origin at the top-left corner of the page; the writer
//! flips them into PDF space.

use crate::domain::display::{
    language_label, progress_text, score_text, status_text, NO_IMAGE, PLACEHOLDER,
};
use crate::domain::{CollectionList, ComicEntry};
use crate::export::{CollectionStats, ExportContext};
use crate::fetcher::covers::decode_data_url;

use super::metrics::{wrap_text, Font, TextMeasure};
use super::JpegImage;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 36.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const FOOTER_SPACE: f32 = 20.0;
/// Lowest y a row may reach.
pub const CONTENT_BOTTOM: f32 = PAGE_HEIGHT - MARGIN - FOOTER_SPACE;

const PAD_X: f32 = 3.0;
const PAD_Y: f32 = 4.0;
const LINE_FACTOR: f32 = 1.25;
const BASE_ROW_HEIGHT: f32 = 28.0;
const COVER_ROW_HEIGHT: f32 = 54.0;
const THUMB_WIDTH: f32 = 32.0;
const THUMB_HEIGHT: f32 = 46.0;
const HEADER_ROW_HEIGHT: f32 = 16.0;
const HEADER_SIZE: f32 = 7.5;
/// Tallest row a fresh page can hold below its table header.
pub const MAX_ROW_HEIGHT: f32 = CONTENT_BOTTOM - MARGIN - HEADER_ROW_HEIGHT;
const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        /// Baseline.
        y: f32,
        font: Font,
        size: f32,
        text: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        gray: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        gray: f32,
    },
    Image {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        index: usize,
    },
}

/// Vertical extent of a placed row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpan {
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
    pub rows: Vec<RowSpan>,
}

#[derive(Debug, Default)]
pub struct DocumentLayout {
    pub pages: Vec<Page>,
    pub images: Vec<JpegImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Index,
    Cover,
    Title,
    List,
    Status,
    Score,
    Progress,
    Tags,
}

impl Column {
    fn label(self) -> &'static str {
        match self {
            Column::Index => "#",
            Column::Cover => "Cover",
            Column::Title => "Title",
            Column::List => "List",
            Column::Status => "Status",
            Column::Score => "Score",
            Column::Progress => "Progress",
            Column::Tags => "Tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TextLine {
    text: String,
    font: Font,
    size: f32,
}

/// A measured row, ready to be placed.
#[derive(Debug, Clone)]
pub struct RowLayout {
    pub height: f32,
    /// Some cell was cut to fit on one page.
    pub truncated: bool,
    /// Some text has characters none of the PDF fonts can show.
    pub lossy: bool,
    cells: Vec<Vec<TextLine>>,
}

impl RowLayout {
    /// Wrapped lines of `column`'s main text.
    pub fn lines(&self, table: &TableLayout, column: Column) -> Vec<String> {
        table
            .position(column)
            .map(|i| self.cells[i].iter().map(|l| l.text.clone()).collect())
            .unwrap_or_default()
    }
}

fn lines_height(lines: &[TextLine]) -> f32 {
    lines.iter().map(|l| l.size * LINE_FACTOR).sum::<f32>() + 2.0 * PAD_Y
}

/// Fixed column plan and the row measurement rules.
pub struct TableLayout<'a> {
    measure: &'a dyn TextMeasure,
    columns: Vec<(Column, f32)>,
    include_covers: bool,
}

impl<'a> TableLayout<'a> {
    pub fn new(measure: &'a dyn TextMeasure, include_covers: bool) -> Self {
        let fixed: &[(Column, f32)] = if include_covers {
            &[
                (Column::Index, 22.0),
                (Column::Cover, 38.0),
                (Column::Title, 160.0),
                (Column::List, 62.0),
                (Column::Status, 52.0),
                (Column::Score, 30.0),
                (Column::Progress, 50.0),
            ]
        } else {
            &[
                (Column::Index, 22.0),
                (Column::Title, 190.0),
                (Column::List, 70.0),
                (Column::Status, 56.0),
                (Column::Score, 32.0),
                (Column::Progress, 52.0),
            ]
        };
        let used: f32 = fixed.iter().map(|(_, w)| w).sum();
        let mut columns = fixed.to_vec();
        columns.push((Column::Tags, CONTENT_WIDTH - used));

        Self {
            measure,
            columns,
            include_covers,
        }
    }

    fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|(c, _)| *c == column)
    }

    pub fn width(&self, column: Column) -> f32 {
        self.position(column)
            .map(|i| self.columns[i].1)
            .unwrap_or(0.0)
    }

    fn wrap(&self, text: &str, font: Font, size: f32, column: Column) -> Vec<TextLine> {
        let max = self.width(column) - 2.0 * PAD_X;
        wrap_text(self.measure, text, font, size, max)
            .into_iter()
            .map(|text| TextLine {
                font: self.measure.face(&text, font),
                text,
                size,
            })
            .collect()
    }

    /// Cut `lines` to what fits in [`MAX_ROW_HEIGHT`], ending the last kept
    /// line with an ellipsis. Returns whether anything was cut.
    fn clamp(&self, lines: &mut Vec<TextLine>, column: Column) -> bool {
        if lines_height(lines) <= MAX_ROW_HEIGHT {
            return false;
        }
        let mut height = 2.0 * PAD_Y;
        let keep = lines
            .iter()
            .take_while(|line| {
                height += line.size * LINE_FACTOR;
                height <= MAX_ROW_HEIGHT
            })
            .count();
        lines.truncate(keep.max(1));

        let max = self.width(column) - 2.0 * PAD_X;
        if let Some(last) = lines.last_mut() {
            let mut kept = last.text.trim_end().to_string();
            loop {
                let candidate = format!("{}{}", kept, ELLIPSIS);
                if kept.is_empty() || self.measure.text_width(&candidate, last.font, last.size) <= max {
                    last.font = self.measure.face(&candidate, last.font);
                    last.text = candidate;
                    break;
                }
                kept.pop();
                kept.truncate(kept.trim_end().len());
            }
        }
        true
    }

    fn base_height(&self) -> f32 {
        if self.include_covers {
            COVER_ROW_HEIGHT
        } else {
            BASE_ROW_HEIGHT
        }
    }

    pub fn layout_row(&self, index: usize, list: &CollectionList, entry: &ComicEntry) -> RowLayout {
        let mut cells: Vec<Vec<TextLine>> = self
            .columns
            .iter()
            .map(|(column, _)| match column {
                Column::Index => self.wrap(&(index + 1).to_string(), Font::Regular, 7.0, *column),
                Column::Cover => Vec::new(),
                Column::Title => {
                    let mut lines = self.wrap(entry.display_title(), Font::Bold, 8.5, *column);
                    if !entry.authors.is_empty() {
                        lines.extend(self.wrap(&entry.authors.join(", "), Font::Oblique, 7.0, *column));
                    }
                    lines
                }
                Column::List => self.wrap(&list.name, Font::Regular, 7.5, *column),
                Column::Status => {
                    let mut lines = self.wrap(status_text(&entry.status), Font::Regular, 7.5, *column);
                    lines.extend(self.wrap(
                        language_label(&entry.origin_language),
                        Font::Oblique,
                        7.0,
                        *column,
                    ));
                    lines
                }
                Column::Score => self.wrap(&score_text(entry.average_score), Font::Regular, 7.5, *column),
                Column::Progress => self.wrap(
                    &progress_text(entry.history.as_ref(), entry.latest_chapter_label.as_deref()),
                    Font::Regular,
                    7.5,
                    *column,
                ),
                Column::Tags => {
                    let tags = if entry.genres.is_empty() {
                        PLACEHOLDER.to_string()
                    } else {
                        entry.genres.join(", ")
                    };
                    self.wrap(&tags, Font::Regular, 7.0, *column)
                }
            })
            .collect();

        let mut truncated = false;
        for (cell, (column, _)) in cells.iter_mut().zip(&self.columns) {
            truncated |= self.clamp(cell, *column);
        }
        if truncated {
            tracing::warn!(
                "PDF row for {} is taller than a page; its text was cut short",
                entry.id
            );
        }

        let authors = entry.authors.join(", ");
        let tags = entry.genres.join(", ");
        let lossy = [entry.display_title(), authors.as_str(), list.name.as_str(), tags.as_str()]
            .iter()
            .any(|text| !self.measure.can_encode(text));
        if lossy {
            tracing::warn!(
                "PDF fonts cannot show some characters of {} ({}); they print as '?'. \
                 Set output.pdf_font to a TrueType font that covers them",
                entry.id,
                entry.display_title()
            );
        }

        let height = cells
            .iter()
            .map(|c| lines_height(c))
            .fold(self.base_height(), f32::max);

        RowLayout {
            height,
            truncated,
            lossy,
            cells,
        }
    }
}

struct PageBuilder<'a> {
    table: &'a TableLayout<'a>,
    pages: Vec<Page>,
    images: Vec<JpegImage>,
    cursor: f32,
}

impl<'a> PageBuilder<'a> {
    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, text: impl Into<String>) {
        let text = text.into();
        let font = self.table.measure.face(&text, font);
        self.current().ops.push(DrawOp::Text {
            x,
            y,
            font,
            size,
            text,
        });
    }

    fn title_block(&mut self, lists: &[CollectionList], ctx: &ExportContext) {
        let stats = CollectionStats::from_lists(lists);
        self.cursor = MARGIN;

        self.text(
            MARGIN,
            self.cursor + 16.0,
            Font::Bold,
            16.0,
            format!("{}'s Collection", ctx.display_name),
        );
        self.cursor += 24.0;
        self.text(
            MARGIN,
            self.cursor + 9.0,
            Font::Regular,
            8.5,
            format!(
                "{} lists ({} with comics) \u{2022} {} comics \u{2022} {} with reading history",
                stats.lists, stats.non_empty_lists, stats.comics, stats.with_history
            ),
        );
        self.cursor += 13.0;
        self.text(
            MARGIN,
            self.cursor + 9.0,
            Font::Oblique,
            8.0,
            format!("Exported {}", ctx.export_date),
        );
        self.cursor += 20.0;
    }

    fn table_header(&mut self) {
        let top = self.cursor;
        self.current().ops.push(DrawOp::FillRect {
            x: MARGIN,
            y: top,
            w: CONTENT_WIDTH,
            h: HEADER_ROW_HEIGHT,
            gray: 0.85,
        });
        let mut x = MARGIN;
        let columns = self.table.columns.clone();
        for (column, width) in columns {
            self.text(x + PAD_X, top + 11.0, Font::Bold, HEADER_SIZE, column.label());
            x += width;
        }
        self.cursor += HEADER_ROW_HEIGHT;
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = MARGIN;
        self.table_header();
    }

    fn place_row(&mut self, row: &RowLayout, entry: &ComicEntry, shaded: bool) {
        // Rows are clamped to MAX_ROW_HEIGHT, so a fresh page always fits one.
        let fits = self.cursor + row.height <= CONTENT_BOTTOM + 0.01;
        let fresh = self.cursor <= MARGIN + HEADER_ROW_HEIGHT + 0.01;
        if !fits && !fresh {
            self.new_page();
        }

        let top = self.cursor;
        if shaded {
            self.current().ops.push(DrawOp::FillRect {
                x: MARGIN,
                y: top,
                w: CONTENT_WIDTH,
                h: row.height,
                gray: 0.96,
            });
        }

        let mut x = MARGIN;
        let columns = self.table.columns.clone();
        for (i, (column, width)) in columns.into_iter().enumerate() {
            if column == Column::Cover {
                self.cover(x, top, width, row.height, entry);
            }
            let mut line_top = top + PAD_Y;
            for line in &row.cells[i] {
                self.text(x + PAD_X, line_top + line.size, line.font, line.size, line.text.clone());
                line_top += line.size * LINE_FACTOR;
            }
            x += width;
        }

        let bottom = top + row.height;
        self.current().ops.push(DrawOp::Line {
            x1: MARGIN,
            y1: bottom,
            x2: MARGIN + CONTENT_WIDTH,
            y2: bottom,
            width: 0.4,
            gray: 0.8,
        });
        self.current().rows.push(RowSpan {
            top,
            height: row.height,
        });
        self.cursor = bottom;
    }

    fn cover(&mut self, x: f32, top: f32, width: f32, height: f32, entry: &ComicEntry) {
        let box_x = x + (width - THUMB_WIDTH) / 2.0;
        let box_y = top + (height - THUMB_HEIGHT) / 2.0;

        let image = entry
            .cover_data
            .as_deref()
            .and_then(decode_data_url)
            .filter(|(mime, _)| mime == "image/jpeg" || mime == "image/jpg")
            .and_then(|(_, bytes)| JpegImage::parse(bytes));

        match image {
            Some(image) => {
                let scale = (THUMB_WIDTH / image.width as f32).min(THUMB_HEIGHT / image.height as f32);
                let w = image.width as f32 * scale;
                let h = image.height as f32 * scale;
                let index = self.images.len();
                self.images.push(image);
                self.current().ops.push(DrawOp::Image {
                    x: box_x + (THUMB_WIDTH - w) / 2.0,
                    y: box_y + (THUMB_HEIGHT - h) / 2.0,
                    w,
                    h,
                    index,
                });
            }
            None => {
                self.current().ops.push(DrawOp::FillRect {
                    x: box_x,
                    y: box_y,
                    w: THUMB_WIDTH,
                    h: THUMB_HEIGHT,
                    gray: 0.9,
                });
                let size = 5.5;
                let text_w = self.table.measure.text_width(NO_IMAGE, Font::Regular, size);
                self.text(
                    box_x + (THUMB_WIDTH - text_w) / 2.0,
                    box_y + THUMB_HEIGHT / 2.0 + 2.0,
                    Font::Regular,
                    size,
                    NO_IMAGE,
                );
            }
        }
    }

    /// Second pass: page numbers need the final page count.
    fn footers(&mut self) {
        let total = self.pages.len();
        for (i, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {}", i + 1, total);
            let size = 8.0;
            let width = self.table.measure.text_width(&label, Font::Regular, size);
            page.ops.push(DrawOp::Text {
                x: (PAGE_WIDTH - width) / 2.0,
                y: PAGE_HEIGHT - MARGIN - 4.0,
                font: Font::Regular,
                size,
                text: label,
            });
        }
    }
}

/// Lay out every entry of every list as one flat table, in encounter order.
pub fn layout_document(
    lists: &[CollectionList],
    ctx: &ExportContext,
    measure: &dyn TextMeasure,
) -> DocumentLayout {
    let table = TableLayout::new(measure, ctx.include_covers);
    let mut builder = PageBuilder {
        table: &table,
        pages: vec![Page::default()],
        images: Vec::new(),
        cursor: MARGIN,
    };

    builder.title_block(lists, ctx);
    builder.table_header();

    let rows = lists
        .iter()
        .flat_map(|list| list.entries.iter().map(move |entry| (list, entry)));
    for (index, (list, entry)) in rows.enumerate() {
        let row = table.layout_row(index, list, entry);
        builder.place_row(&row, entry, index % 2 == 1);
    }

    builder.footers();
    tracing::debug!(
        "PDF layout: {} pages, {} images",
        builder.pages.len(),
        builder.images.len()
    );

    DocumentLayout {
        pages: builder.pages,
        images: builder.images,
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use std::sync::Arc;

    use super::*;
    use crate::export::fixtures;
    use crate::export::pdf::metrics::{test_font, FontBook, Helvetica, UnicodeFont};

    const LONG_TITLE: &str = "The Greatest Estate Developer Who Accidentally Rebuilt \
        The Entire Ruined Northern Territory With Nothing But A Shovel";

    fn many(count: usize) -> Vec<CollectionList> {
        let mut a = CollectionList::new("1", "A", true);
        let mut b = CollectionList::new("2", "B", false);
        for i in 0..count {
            let entry = ComicEntry::new(format!("c{}", i), format!("Comic number {}", i));
            if i < count / 2 {
                a.entries.push(entry);
            } else {
                b.entries.push(entry);
            }
        }
        vec![a, b]
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_columns_fill_content_width() {
        for covers in [false, true] {
            let table = TableLayout::new(&Helvetica, covers);
            let total: f32 = table.columns.iter().map(|(_, w)| w).sum();
            assert!((total - CONTENT_WIDTH).abs() < 0.01);
            assert!(table.width(Column::Tags) > 60.0);
        }
    }

    #[test]
    fn test_long_title_wraps_and_grows_row() {
        let table = TableLayout::new(&Helvetica, false);
        let list = CollectionList::new("1", "A", true);

        let short = table.layout_row(0, &list, &ComicEntry::new("c1", "Short"));
        let long = table.layout_row(0, &list, &ComicEntry::new("c2", LONG_TITLE));

        assert!(Helvetica.text_width(LONG_TITLE, Font::Bold, 8.5) > table.width(Column::Title));
        let lines = long.lines(&table, Column::Title);
        assert!(lines.len() >= 2);
        assert_eq!(lines.join(" "), LONG_TITLE);
        assert!(long.height > short.height);
        assert_eq!(short.height, BASE_ROW_HEIGHT);
    }

    #[test]
    fn test_tags_drive_row_height() {
        let table = TableLayout::new(&Helvetica, false);
        let list = CollectionList::new("1", "A", true);
        let mut entry = ComicEntry::new("c1", "Short");
        entry.genres = (0..30).map(|i| format!("Genre{}", i)).collect();

        let row = table.layout_row(0, &list, &entry);
        assert!(row.lines(&table, Column::Tags).len() >= 3);
        assert!(row.height > BASE_ROW_HEIGHT);
    }

    #[test]
    fn test_cover_rows_have_taller_base() {
        let table = TableLayout::new(&Helvetica, true);
        let list = CollectionList::new("1", "A", true);
        let row = table.layout_row(0, &list, &ComicEntry::new("c1", "Short"));
        assert_eq!(row.height, COVER_ROW_HEIGHT);
    }

    #[test]
    fn test_rows_never_split_across_pages() {
        let mut lists = many(150);
        lists[0].entries[3].title = LONG_TITLE.repeat(3);
        let layout = layout_document(&lists, &fixtures::ctx(), &Helvetica);

        assert!(layout.pages.len() > 1);
        let mut placed = 0;
        for page in &layout.pages {
            for row in &page.rows {
                assert!(row.top >= MARGIN);
                assert!(row.top + row.height <= CONTENT_BOTTOM + 0.001);
            }
            placed += page.rows.len();
        }
        assert_eq!(placed, 150);
    }

    #[test]
    fn test_oversize_row_is_cut_to_one_page() {
        let huge = vec!["Leveling"; 3000].join(" ");
        let mut list = CollectionList::new("1", "A", true);
        list.entries.push(ComicEntry::new("c-huge", huge.as_str()));
        list.entries.push(ComicEntry::new("c-next", "After"));

        let table = TableLayout::new(&Helvetica, false);
        let row = table.layout_row(0, &list, &list.entries[0]);
        assert!(row.truncated);
        assert!(row.height <= MAX_ROW_HEIGHT);
        let lines = row.lines(&table, Column::Title);
        assert!(lines.last().unwrap().ends_with('\u{2026}'));
        for line in &lines {
            assert!(Helvetica.text_width(line, Font::Bold, 8.5) <= table.width(Column::Title));
        }

        let layout = layout_document(&[list], &fixtures::ctx(), &Helvetica);
        // The title block leaves too little room, so the row opens page 2.
        assert!(layout.pages[0].rows.is_empty());
        let placed: Vec<RowSpan> = layout.pages.iter().flat_map(|p| p.rows.clone()).collect();
        assert_eq!(placed.len(), 2);
        for page in &layout.pages {
            for row in &page.rows {
                assert!(row.top + row.height <= CONTENT_BOTTOM + 0.01);
            }
        }
    }

    #[test]
    fn test_short_rows_are_not_truncated() {
        let table = TableLayout::new(&Helvetica, true);
        let list = CollectionList::new("1", "A", true);
        let row = table.layout_row(0, &list, &ComicEntry::new("c2", LONG_TITLE));
        assert!(!row.truncated);
        assert!(!row.lossy);
    }

    #[test]
    fn test_non_latin_titles_need_an_embedded_font() {
        let title = "\u{B098} \u{D63C}\u{C790}\u{B9CC} \u{B808}\u{BCA8}\u{C5C5}";
        let list = CollectionList::new("1", "A", true);
        let entry = ComicEntry::new("c1", title);

        let plain = TableLayout::new(&Helvetica, false).layout_row(0, &list, &entry);
        assert!(plain.lossy);

        let font = UnicodeFont::from_bytes("Test", test_font::build(title)).unwrap();
        let book = FontBook::new(Some(Arc::new(font)));
        let table = TableLayout::new(&book, false);
        let row = table.layout_row(0, &list, &entry);
        assert!(!row.lossy);
        assert_eq!(row.lines(&table, Column::Title), vec![title.to_string()]);

        let mut list = list;
        list.entries.push(entry);
        let layout = layout_document(&[list], &fixtures::ctx(), &book);
        let drawn = layout.pages[0].ops.iter().find_map(|op| match op {
            DrawOp::Text { text, font, .. } if text == title => Some(*font),
            _ => None,
        });
        assert_eq!(drawn, Some(Font::Unicode));
        assert!(texts(&layout.pages[0]).contains(&"Title"));
    }

    #[test]
    fn test_header_repeated_and_footer_on_every_page() {
        let layout = layout_document(&many(150), &fixtures::ctx(), &Helvetica);
        let total = layout.pages.len();

        for (i, page) in layout.pages.iter().enumerate() {
            let texts = texts(page);
            assert_eq!(texts.iter().filter(|t| **t == "Title").count(), 1);
            assert_eq!(texts.iter().filter(|t| **t == "Progress").count(), 1);
            let footer = format!("Page {} of {}", i + 1, total);
            assert_eq!(texts.last().copied(), Some(footer.as_str()));
        }
    }

    #[test]
    fn test_rows_follow_encounter_order_across_lists() {
        let layout = layout_document(&many(6), &fixtures::ctx(), &Helvetica);
        let page = &layout.pages[0];
        let titles: Vec<&str> = texts(page)
            .into_iter()
            .filter(|t| t.starts_with("Comic number"))
            .collect();
        assert_eq!(
            titles,
            (0..6).map(|i| format!("Comic number {}", i)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_empty_lists_produce_no_rows() {
        let layout = layout_document(&fixtures::scenario(), &fixtures::ctx(), &Helvetica);
        assert_eq!(layout.pages.len(), 1);
        assert_eq!(layout.pages[0].rows.len(), 1);
        let texts = texts(&layout.pages[0]);
        assert!(texts.contains(&"Solo Leveling"));
        assert!(texts.contains(&"? / 200"));
        assert!(texts.contains(&"Unknown"));
        assert!(texts.contains(&"Manhwa"));
    }

    #[test]
    fn test_covers_embedded_only_for_jpeg() {
        let jpeg = [
            0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x40, 0x00, 0x20, 0x03, 0x01, 0x22,
            0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01, 0xFF, 0xD9,
        ];
        let mut lists = many(2);
        lists[0].entries[0].cover_data =
            Some(format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg)));
        lists[1].entries[0].cover_data = Some("data:image/png;base64,iVBORw0KGgo=".into());

        let ctx = fixtures::ctx().with_covers(true);
        let layout = layout_document(&lists, &ctx, &Helvetica);

        assert_eq!(layout.images.len(), 1);
        assert_eq!((layout.images[0].width, layout.images[0].height), (32, 64));
        let page = &layout.pages[0];
        let images = page
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count();
        assert_eq!(images, 1);
        assert_eq!(texts(page).iter().filter(|t| **t == NO_IMAGE).count(), 1);
    }
}
