use std::collections::BTreeMap;
use std::fmt::Write;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::app::Result;

use super::layout::{DocumentLayout, DrawOp, Page, PAGE_HEIGHT, PAGE_WIDTH};
use super::metrics::{encode_winansi, is_winansi, Font, UnicodeFont};

const TYPE1_FONTS: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

/// Serialize a laid-out document with the standard Type1 fonts, plus
/// `unicode` as a Type0 font when the layout draws with it.
pub fn write_pdf(
    layout: &DocumentLayout,
    title: &str,
    unicode: Option<&UnicodeFont>,
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in TYPE1_FONTS {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font().unwrap_or("Helvetica"),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), id);
    }
    if let Some(unicode) = unicode {
        let glyphs = used_glyphs(layout, unicode);
        if !glyphs.is_empty() {
            let id = embed_unicode_font(&mut doc, unicode, &glyphs)?;
            fonts.set(Font::Unicode.resource_name(), id);
        }
    }

    let mut xobjects = Dictionary::new();
    for (i, image) in layout.images.iter().enumerate() {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => image.color_space(),
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        };
        // Already DCT compressed.
        let stream = Stream::new(dict, image.data.clone()).with_compression(false);
        xobjects.set(image_name(i), doc.add_object(stream));
    }

    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(page, unicode),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(title),
        "Producer" => Object::string_literal(concat!("mylist-exporter ", env!("CARGO_PKG_VERSION"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Glyph id to the character it shows, for every text drawn with the
/// embedded font.
fn used_glyphs(layout: &DocumentLayout, unicode: &UnicodeFont) -> BTreeMap<u16, char> {
    let mut glyphs = BTreeMap::new();
    for page in &layout.pages {
        for op in &page.ops {
            if let DrawOp::Text {
                font: Font::Unicode,
                text,
                ..
            } = op
            {
                for c in text.chars() {
                    glyphs.entry(unicode.glyph_id(c)).or_insert(c);
                }
            }
        }
    }
    glyphs
}

fn int(value: i64) -> Object {
    Object::Integer(value)
}

fn embed_unicode_font(
    doc: &mut Document,
    unicode: &UnicodeFont,
    glyphs: &BTreeMap<u16, char>,
) -> Result<ObjectId> {
    let data = unicode.data().to_vec();
    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => data.len() as i64 },
        data,
    ));

    let (ascent, descent) = unicode.vertical_metrics();
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => unicode.name(),
        "Flags" => 4_i64,
        "FontBBox" => vec![int(0), int(descent as i64), int(1000), int(ascent as i64)],
        "ItalicAngle" => 0_i64,
        "Ascent" => ascent as i64,
        "Descent" => descent as i64,
        "CapHeight" => ascent as i64,
        "StemV" => 80_i64,
        "FontFile2" => file_id,
    });

    let mut widths = Vec::with_capacity(glyphs.len() * 2);
    for glyph in glyphs.keys() {
        widths.push(int(i64::from(*glyph)));
        widths.push(Object::Array(vec![int(unicode.advance(*glyph).round() as i64)]));
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => unicode.name(),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0_i64,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 1000_i64,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(glyphs)?.into_bytes()));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => unicode.name(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::from(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    }))
}

/// Lets viewers copy and search text drawn by glyph id.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> std::result::Result<String, std::fmt::Error> {
    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    let entries: Vec<(&u16, &char)> = glyphs.iter().collect();
    for chunk in entries.chunks(100) {
        writeln!(out, "{} beginbfchar", chunk.len())?;
        for (glyph, c) in chunk {
            let mut units = [0_u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            writeln!(out, "<{:04X}> <{}>", glyph, hex)?;
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    Ok(out)
}

/// Document info strings: plain when WinAnsi covers them, UTF-16BE otherwise.
fn text_string(text: &str) -> Object {
    if is_winansi(text) {
        return Object::string_literal(encode_winansi(text));
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn page_operations(page: &Page, unicode: Option<&UnicodeFont>) -> Vec<Operation> {
    let mut ops = Vec::new();
    for draw in &page.ops {
        match draw {
            DrawOp::Text {
                x,
                y,
                font,
                size,
                text,
            } => {
                let (resource, shown) = match (font, unicode) {
                    (Font::Unicode, Some(unicode)) => (
                        Font::Unicode.resource_name(),
                        Object::String(unicode.encode(text), StringFormat::Hexadecimal),
                    ),
                    (Font::Unicode, None) => (
                        Font::Regular.resource_name(),
                        Object::string_literal(encode_winansi(text)),
                    ),
                    (font, _) => (
                        font.resource_name(),
                        Object::string_literal(encode_winansi(text)),
                    ),
                };
                ops.push(op("BT", vec![]));
                ops.push(op("g", vec![real(0.0)]));
                ops.push(op("Tf", vec![resource.into(), real(*size)]));
                ops.push(op("Td", vec![real(*x), real(PAGE_HEIGHT - y)]));
                ops.push(op("Tj", vec![shown]));
                ops.push(op("ET", vec![]));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                gray,
            } => {
                ops.push(op("w", vec![real(*width)]));
                ops.push(op("G", vec![real(*gray)]));
                ops.push(op("m", vec![real(*x1), real(PAGE_HEIGHT - y1)]));
                ops.push(op("l", vec![real(*x2), real(PAGE_HEIGHT - y2)]));
                ops.push(op("S", vec![]));
            }
            DrawOp::FillRect { x, y, w, h, gray } => {
                ops.push(op("g", vec![real(*gray)]));
                ops.push(op(
                    "re",
                    vec![real(*x), real(PAGE_HEIGHT - y - h), real(*w), real(*h)],
                ));
                ops.push(op("f", vec![]));
            }
            DrawOp::Image { x, y, w, h, index } => {
                ops.push(op("q", vec![]));
                ops.push(op(
                    "cm",
                    vec![
                        real(*w),
                        real(0.0),
                        real(0.0),
                        real(*h),
                        real(*x),
                        real(PAGE_HEIGHT - y - h),
                    ],
                ));
                ops.push(op("Do", vec![image_name(*index).as_str().into()]));
                ops.push(op("Q", vec![]));
            }
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{CollectionList, ComicEntry};
    use crate::export::fixtures;
    use crate::export::pdf::layout::layout_document;
    use crate::export::pdf::metrics::{test_font, FontBook, Helvetica};
    use crate::export::pdf::render_pdf;

    const HANGUL: &str = "\u{B098} \u{D63C}\u{C790}\u{B9CC} \u{B808}\u{BCA8}\u{C5C5}";

    fn text_page(font: Font, text: &str) -> Page {
        Page {
            ops: vec![DrawOp::Text {
                x: 36.0,
                y: 100.0,
                font,
                size: 9.0,
                text: text.into(),
            }],
            rows: Vec::new(),
        }
    }

    fn tj_operand(ops: &[Operation]) -> &Object {
        &ops.iter().find(|o| o.operator == "Tj").unwrap().operands[0]
    }

    #[test]
    fn test_output_loads_with_expected_page_count() {
        let mut lists = fixtures::scenario();
        for i in 0..80 {
            lists[0]
                .entries
                .push(crate::domain::ComicEntry::new(format!("x{}", i), format!("Extra {}", i)));
        }
        let ctx = fixtures::ctx();
        let expected = layout_document(&lists, &ctx, &Helvetica).pages.len();
        assert!(expected > 1);

        let bytes = render_pdf(&lists, &ctx).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), expected);
    }

    #[test]
    fn test_text_is_flipped_into_pdf_space() {
        let ops = page_operations(&text_page(Font::Bold, "Hi"), None);
        let td = ops.iter().find(|o| o.operator == "Td").unwrap();
        assert!(matches!(td.operands[0], Object::Real(x) if x == 36.0));
        assert!(matches!(td.operands[1], Object::Real(y) if (y - (PAGE_HEIGHT - 100.0)).abs() < 0.001));
        let tf = ops.iter().find(|o| o.operator == "Tf").unwrap();
        assert!(matches!(&tf.operands[0], Object::Name(name) if name == b"F2"));
    }

    #[test]
    fn test_non_latin_text_is_written_as_glyph_ids() {
        let font = UnicodeFont::from_bytes("Test", test_font::build(HANGUL)).unwrap();
        let ops = page_operations(&text_page(Font::Unicode, HANGUL), Some(&font));

        let tf = ops.iter().find(|o| o.operator == "Tf").unwrap();
        assert!(matches!(&tf.operands[0], Object::Name(name) if name == b"F4"));
        match tj_operand(&ops) {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, &font.encode(HANGUL));
                assert_eq!(bytes.len(), HANGUL.chars().count() * 2);
                assert!(!bytes.contains(&b'?'));
            }
            other => panic!("unexpected operand {:?}", other),
        }
    }

    #[test]
    fn test_without_embedded_font_text_falls_back_to_helvetica() {
        let ops = page_operations(&text_page(Font::Unicode, HANGUL), None);
        let tf = ops.iter().find(|o| o.operator == "Tf").unwrap();
        assert!(matches!(&tf.operands[0], Object::Name(name) if name == b"F1"));
        assert!(matches!(tj_operand(&ops), Object::String(bytes, _) if bytes == b"? ??? ???"));
    }

    #[test]
    fn test_embedded_font_is_written_as_type0() {
        let font = Arc::new(UnicodeFont::from_bytes("Test", test_font::build(HANGUL)).unwrap());
        let book = FontBook::new(Some(font.clone()));
        let mut list = CollectionList::new("1", "A", true);
        list.entries.push(ComicEntry::new("c1", HANGUL));
        let layout = layout_document(&[list], &fixtures::ctx(), &book);

        let bytes = write_pdf(&layout, HANGUL, Some(&font)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let subtype_count = |wanted: &[u8]| {
            doc.objects
                .values()
                .filter_map(|o| o.as_dict().ok())
                .filter(|d| matches!(d.get(b"Subtype"), Ok(Object::Name(n)) if n == wanted))
                .count()
        };
        assert_eq!(subtype_count(b"Type0"), 1);
        assert_eq!(subtype_count(b"CIDFontType2"), 1);
        assert_eq!(subtype_count(b"Type1"), 3);
    }

    #[test]
    fn test_to_unicode_maps_glyphs_back() {
        let glyphs: BTreeMap<u16, char> = [(1, ' '), (5, '\u{B098}')].into_iter().collect();
        let cmap = to_unicode_cmap(&glyphs).unwrap();
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0005> <B098>"));
        assert!(cmap.contains("<0001> <0020>"));
    }
}
