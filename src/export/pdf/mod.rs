//! Printable PDF: one flat table of every comic.

pub mod layout;
pub mod metrics;
pub mod writer;

use crate::app::Result;
use crate::domain::CollectionList;

use self::metrics::FontBook;
use super::ExportContext;

/// A baseline or progressive JPEG that can be embedded as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegImage {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub data: Vec<u8>,
}

impl JpegImage {
    /// Read dimensions from the first start-of-frame marker.
    pub fn parse(data: Vec<u8>) -> Option<Self> {
        if !data.starts_with(&[0xFF, 0xD8]) {
            return None;
        }

        let mut i = 2;
        while i + 3 < data.len() {
            if data[i] != 0xFF {
                return None;
            }
            let marker = data[i + 1];
            match marker {
                0xFF => {
                    i += 1;
                    continue;
                }
                0x01 | 0xD0..=0xD8 => {
                    i += 2;
                    continue;
                }
                // Scan data or end of image before any frame header.
                0xD9 | 0xDA => return None,
                _ => {}
            }

            let len = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
            let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
            if is_frame {
                let frame = data.get(i + 4..i + 10)?;
                let height = u32::from(u16::from_be_bytes([frame[1], frame[2]]));
                let width = u32::from(u16::from_be_bytes([frame[3], frame[4]]));
                let components = frame[5];
                if width == 0 || height == 0 || !matches!(components, 1 | 3 | 4) {
                    return None;
                }
                return Some(Self {
                    width,
                    height,
                    components,
                    data,
                });
            }
            i += 2 + len;
        }
        None
    }

    pub fn color_space(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

pub fn render_pdf(lists: &[CollectionList], ctx: &ExportContext) -> Result<Vec<u8>> {
    let book = FontBook::new(ctx.pdf_font.clone());
    let layout = layout::layout_document(lists, ctx, &book);
    writer::write_pdf(
        &layout,
        &format!("{}'s Collection", ctx.display_name),
        book.unicode(),
    )
}
