//! Text measurement for the standard Helvetica faces and an optional
//! embedded TrueType font.
//!
//! Text is measured in the same encoding it is written with, so what is
//! measured is exactly what ends up on the page.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::app::{ExportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
    /// The embedded TrueType font, for text outside WinAnsi.
    Unicode,
}

impl Font {
    /// Resource name used in page content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
            Font::Unicode => "F4",
        }
    }

    /// Standard Type1 name; `None` for the embedded font.
    pub fn base_font(self) -> Option<&'static str> {
        match self {
            Font::Regular => Some("Helvetica"),
            Font::Bold => Some("Helvetica-Bold"),
            Font::Oblique => Some("Helvetica-Oblique"),
            Font::Unicode => None,
        }
    }
}

pub trait TextMeasure {
    /// Width of `text` in points at `size`.
    fn text_width(&self, text: &str, font: Font, size: f32) -> f32;

    /// Face `text` is actually drawn with when `font` is asked for.
    fn face(&self, _text: &str, font: Font) -> Font {
        font
    }

    /// Whether every character of `text` can be shown.
    fn can_encode(&self, text: &str) -> bool {
        is_winansi(text)
    }
}

/// Advance widths (1/1000 em) for WinAnsi 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :;<=>?@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [\]^_`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // {|}~
];

/// Metrics of the built-in PDF Helvetica family.
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

impl Helvetica {
    fn byte_width(byte: u8, font: Font) -> u16 {
        let table = match font {
            Font::Bold => &HELVETICA_BOLD,
            Font::Regular | Font::Oblique | Font::Unicode => &HELVETICA,
        };
        match byte {
            0x20..=0x7E => table[(byte - 0x20) as usize],
            0x85 | 0x97 => 1000,
            0x91 | 0x92 => 222,
            0x93 | 0x94 => 333,
            0x95 => 350,
            0x96 => 556,
            _ => 556,
        }
    }
}

impl TextMeasure for Helvetica {
    fn text_width(&self, text: &str, font: Font, size: f32) -> f32 {
        let units: u32 = encode_winansi(text)
            .into_iter()
            .map(|b| u32::from(Self::byte_width(b, font)))
            .sum();
        units as f32 * size / 1000.0
    }
}

fn winansi_byte(c: char) -> Option<u8> {
    match c {
        ' '..='~' => Some(c as u8),
        '\u{A0}'..='\u{FF}' => Some(c as u32 as u8),
        '\u{2026}' => Some(0x85),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\t' | '\n' | '\r' => Some(b' '),
        _ => None,
    }
}

/// Map text onto WinAnsiEncoding; characters outside it become `?`.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| winansi_byte(c).unwrap_or(b'?'))
        .collect()
}

pub fn is_winansi(text: &str) -> bool {
    text.chars().all(|c| winansi_byte(c).is_some())
}

/// A TrueType font embedded whole and addressed by glyph id (Identity-H).
pub struct UnicodeFont {
    name: String,
    data: Vec<u8>,
    face: fontdue::Font,
}

impl fmt::Debug for UnicodeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnicodeFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl UnicodeFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::from_bytes(name, data)
    }

    /// Only single TrueType fonts qualify: collections and CFF-flavoured
    /// OpenType cannot be embedded as `FontFile2`.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self> {
        if !(data.starts_with(&[0, 1, 0, 0]) || data.starts_with(b"true")) {
            return Err(ExportError::Config(format!(
                "PDF font {} is not a single TrueType (.ttf) font",
                name
            )));
        }
        let face = fontdue::Font::from_bytes(data.as_slice(), fontdue::FontSettings::default())
            .map_err(|e| ExportError::Config(format!("unreadable PDF font {}: {}", name, e)))?;

        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        Ok(Self {
            name: if name.is_empty() { "EmbeddedFont".into() } else { name },
            data,
            face,
        })
    }

    /// PDF-safe font name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn glyph_id(&self, c: char) -> u16 {
        let c = if c.is_whitespace() { ' ' } else { c };
        self.face.lookup_glyph_index(c)
    }

    pub fn has_glyph(&self, c: char) -> bool {
        c.is_whitespace() || self.glyph_id(c) != 0
    }

    /// Advance width in 1/1000 em.
    pub fn advance(&self, glyph: u16) -> f32 {
        self.face.metrics_indexed(glyph, 1000.0).advance_width
    }

    /// Ascent and descent in 1/1000 em.
    pub fn vertical_metrics(&self) -> (f32, f32) {
        self.face
            .horizontal_line_metrics(1000.0)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((800.0, -200.0))
    }

    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.advance(self.glyph_id(c))).sum();
        units * size / 1000.0
    }

    /// Two-byte big-endian glyph ids.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .flat_map(|c| self.glyph_id(c).to_be_bytes())
            .collect()
    }
}

/// Helvetica for everything WinAnsi covers, the embedded font (when one is
/// configured) for the rest.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    unicode: Option<Arc<UnicodeFont>>,
}

impl FontBook {
    pub fn new(unicode: Option<Arc<UnicodeFont>>) -> Self {
        Self { unicode }
    }

    pub fn unicode(&self) -> Option<&UnicodeFont> {
        self.unicode.as_deref()
    }
}

impl TextMeasure for FontBook {
    fn text_width(&self, text: &str, font: Font, size: f32) -> f32 {
        match (self.face(text, font), self.unicode()) {
            (Font::Unicode, Some(unicode)) => unicode.text_width(text, size),
            (face, _) => Helvetica.text_width(text, face, size),
        }
    }

    fn face(&self, text: &str, font: Font) -> Font {
        if self.unicode.is_some() && !is_winansi(text) {
            Font::Unicode
        } else {
            font
        }
    }

    fn can_encode(&self, text: &str) -> bool {
        is_winansi(text)
            || self
                .unicode()
                .is_some_and(|u| text.chars().all(|c| u.has_glyph(c)))
    }
}

/// Greedy word wrap to `max_width`. Words wider than a line are broken
/// between characters. Always returns at least one line.
pub fn wrap_text(
    measure: &dyn TextMeasure,
    text: &str,
    font: Font,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure.text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if measure.text_width(word, font, size) <= max_width {
            current = word.to_string();
        } else {
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && measure.text_width(&next, font, size) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                } else {
                    current = next;
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
