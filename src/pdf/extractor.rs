/*!
 * Text block extraction.
 *
 * Characters come from `pdfplumber`, which interprets the page content
 * streams. Words are clustered into lines and lines into blocks with the
 * `pdfplumber-core` layout functions; each block then takes the style of
 * its longest word.
 *
 * Document info and the image listing read the object model through lopdf.
 */

use log::{debug, warn};
use lopdf::{Document, Object};
use pdfplumber::{Page, Pdf, WordOptions};
use pdfplumber_core::{
    Char, Color, Word, cluster_lines_into_blocks, cluster_words_into_lines, sort_blocks_reading_order,
    split_lines_at_columns,
};
use std::collections::BTreeMap;

use crate::errors::PdfError;
use crate::pdf::{
    BBox, DocumentInfo, ImageInfo, TextBlock, TextStyle, decode_text_simple, load, media_box, page_ids,
    page_resources, resolve, resource_category,
};

/// Midline distance in points under which words share a line
const LINE_Y_TOLERANCE: f64 = 3.0;
/// Horizontal gap in points that splits a line into column segments
const COLUMN_GAP: f64 = 10.0;
/// Vertical gap in points under which a line joins the block above it
const BLOCK_Y_DENSITY: f64 = 10.0;

const BOLD_MARKERS: [&str; 4] = ["bold", "black", "heavy", "semibold"];

fn open(bytes: &[u8]) -> Result<Pdf, PdfError> {
    if bytes.is_empty() {
        return Err(PdfError::DocumentFormat("empty input".to_string()));
    }
    Pdf::open(bytes, None).map_err(|e| PdfError::DocumentFormat(e.to_string()))
}

/// Interpreted pages; a page whose content cannot be read is skipped
fn pages(pdf: &Pdf) -> impl Iterator<Item = (usize, Page)> + '_ {
    (0..pdf.page_count()).filter_map(move |index| match pdf.page(index) {
        Ok(page) => Some((index, page)),
        Err(e) => {
            warn!("Page {}: cannot interpret content: {}", index + 1, e);
            None
        }
    })
}

fn to_bbox(b: &pdfplumber_core::BBox) -> BBox {
    BBox::new(b.x0 as f32, b.top as f32, b.x1 as f32, b.bottom as f32)
}

fn char_style(ch: &Char) -> TextStyle {
    let name = ch.fontname.to_lowercase();
    let [_, _, c, d, _, _] = ch.ctm;
    let scale = (c * c + d * d).sqrt();

    TextStyle {
        font_size: (ch.size * if scale > 0.0 { scale } else { 1.0 }) as f32,
        bold: BOLD_MARKERS.iter().any(|marker| name.contains(marker)),
        italic: name.contains("italic") || name.contains("oblique"),
        color: match ch.resolved_color() {
            Some(Color::Rgb(r, g, b)) => Some([r as f32, g as f32, b as f32]),
            _ => None,
        },
    }
}

/// Style of the word carrying most characters
fn dominant_style<'a>(words: impl Iterator<Item = &'a Word>) -> TextStyle {
    words
        .max_by_key(|w| w.chars.len())
        .and_then(|w| w.chars.first())
        .map(char_style)
        .unwrap_or_default()
}

fn page_blocks(page: &Page, page_index: usize, next_order: &mut usize) -> Vec<TextBlock> {
    let words = page.extract_words(&WordOptions::default());
    let lines = split_lines_at_columns(cluster_words_into_lines(&words, LINE_Y_TOLERANCE), COLUMN_GAP);
    let mut groups = cluster_lines_into_blocks(lines, BLOCK_Y_DENSITY);
    sort_blocks_reading_order(&mut groups, COLUMN_GAP);

    let mut blocks = Vec::with_capacity(groups.len());
    for group in groups {
        let text = group
            .lines
            .iter()
            .map(|line| line.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        if text.trim().is_empty() {
            continue;
        }

        blocks.push(TextBlock {
            page_index,
            bbox: to_bbox(&group.bbox),
            text,
            order_index: *next_order,
            style: dominant_style(group.lines.iter().flat_map(|line| &line.words)),
        });
        *next_order += 1;
    }

    debug!("Page {}: {} text block(s)", page_index + 1, blocks.len());
    blocks
}

/// Positioned text blocks of every page, in page then reading order
pub fn extract(bytes: &[u8]) -> Result<Vec<TextBlock>, PdfError> {
    let pdf = open(bytes)?;
    let mut order = 0;
    Ok(pages(&pdf)
        .flat_map(|(index, page)| page_blocks(&page, index, &mut order))
        .collect())
}

/// Page texts joined with a blank line
pub fn extract_plain_text(bytes: &[u8]) -> Result<String, PdfError> {
    let pdf = open(bytes)?;
    let mut texts = vec![String::new(); pdf.page_count()];
    let mut order = 0;
    for (index, page) in pages(&pdf) {
        texts[index] = page_blocks(&page, index, &mut order)
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
    Ok(texts.join("\n\n"))
}

/// Whether any page holds non-whitespace text
pub fn has_extractable_text(bytes: &[u8]) -> Result<bool, PdfError> {
    let pdf = open(bytes)?;
    Ok(pages(&pdf).any(|(_, page)| page.chars().iter().any(|c| !c.text.trim().is_empty())))
}

/// Page count, first page size, encryption flag and Info metadata
pub fn get_info(bytes: &[u8]) -> Result<DocumentInfo, PdfError> {
    let doc = load(bytes)?;
    let pages = page_ids(&doc);
    let (page_width, page_height) = match pages.first() {
        Some(id) => {
            let mb = media_box(&doc, *id);
            (mb[2] - mb[0], mb[3] - mb[1])
        }
        None => (0.0, 0.0),
    };

    Ok(DocumentInfo {
        page_count: pages.len(),
        byte_size: bytes.len(),
        page_width,
        page_height,
        encrypted: doc.is_encrypted(),
        metadata: metadata(&doc),
    })
}

fn metadata(doc: &Document) -> BTreeMap<String, String> {
    let info = match doc.trailer.get(b"Info").map(|o| resolve(doc, o)) {
        Ok(Object::Dictionary(dict)) => dict,
        _ => return BTreeMap::new(),
    };

    info.iter()
        .filter_map(|(key, value)| match resolve(doc, value) {
            Object::String(bytes, _) => Some((String::from_utf8_lossy(key).to_string(), decode_text_simple(bytes))),
            Object::Name(name) => Some((String::from_utf8_lossy(key).to_string(), String::from_utf8_lossy(name).to_string())),
            _ => None,
        })
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
}

/// Image XObjects referenced by each page
pub fn extract_images_info(bytes: &[u8]) -> Result<Vec<ImageInfo>, PdfError> {
    let doc = load(bytes)?;
    let mut images = Vec::new();

    for (page_index, page_id) in page_ids(&doc).into_iter().enumerate() {
        let Some(resources) = page_resources(&doc, page_id) else {
            continue;
        };
        let xobjects = resource_category(&doc, &resources, b"XObject");

        let mut index = 0;
        for (name, value) in xobjects.iter() {
            let Object::Stream(stream) = resolve(&doc, value) else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .and_then(Object::as_name)
                .is_ok_and(|s| s == b"Image");
            if !is_image {
                continue;
            }

            let dimension = |key: &[u8]| {
                stream
                    .dict
                    .get(key)
                    .ok()
                    .and_then(|o| resolve(&doc, o).as_i64().ok())
                    .unwrap_or(0)
                    .max(0) as u32
            };
            images.push(ImageInfo {
                page_index,
                index,
                name: String::from_utf8_lossy(name).to_string(),
                width: dimension(b"Width"),
                height: dimension(b"Height"),
            });
            index += 1;
        }
    }

    Ok(images)
}
