/*!
 * PDF reading and writing.
 *
 * - `extractor`: positioned text blocks, document info and image listing
 * - `rewriter`: in-place replacement of block text with translations
 * - `reflow`: plain flowing-text document used when rewriting fails
 * - `fonts`: metrics and encoders for the fonts written by the rewriters
 *
 * Block boxes use a top-left page origin: `y` grows downward from the top
 * edge of the MediaBox, `x` grows rightward from its left edge.
 */

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

use crate::errors::PdfError;

pub mod extractor;
pub mod fonts;
pub mod reflow;
pub mod rewriter;

pub use extractor::{extract, extract_images_info, extract_plain_text, get_info, has_extractable_text};
pub use reflow::reflow;
pub use rewriter::{RewriteOptions, rewrite};

/// US Letter, used when no MediaBox can be found
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Axis-aligned box in points, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Box from two corners in any order
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Dominant text style of a block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    /// Fill colour as RGB in `0.0..=1.0`, when the content stream set one
    pub color: Option<[f32; 3]>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            bold: false,
            italic: false,
            color: None,
        }
    }
}

/// A positioned run of text lines on one page
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Zero-based page index
    pub page_index: usize,
    pub bbox: BBox,
    /// Line texts joined with `\n`; never blank
    pub text: String,
    /// Global extraction order across the document
    pub order_index: usize,
    pub style: TextStyle,
}

/// Summary of a loaded document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub byte_size: usize,
    /// Width of the first page, 0 for a document without pages
    pub page_width: f32,
    /// Height of the first page, 0 for a document without pages
    pub page_height: f32,
    pub encrypted: bool,
    /// Info dictionary entries (Title, Author, ...)
    pub metadata: BTreeMap<String, String>,
}

/// An image XObject referenced by a page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub page_index: usize,
    /// Position among the images of its page
    pub index: usize,
    /// Resource name, e.g. `Im0`
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Parse `bytes` into a document, mapping every failure to `DocumentFormat`
pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfError> {
    if bytes.is_empty() {
        return Err(PdfError::DocumentFormat("empty input".to_string()));
    }
    Document::load_mem(bytes).map_err(|e| PdfError::DocumentFormat(e.to_string()))
}

/// Page object ids in page order
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Read a number operand or array entry
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// MediaBox of a page, inherited through the page tree
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    match doc.get_object(page_id) {
        Ok(page) => media_box_recursive(doc, page, 10),
        Err(_) => DEFAULT_MEDIA_BOX,
    }
}

fn media_box_recursive(doc: &Document, node: &Object, depth: usize) -> [f32; 4] {
    if depth == 0 {
        return DEFAULT_MEDIA_BOX;
    }

    if let Object::Dictionary(dict) = node {
        if let Ok(Object::Array(arr)) = dict.get(b"MediaBox").map(|o| resolve(doc, o)) {
            let values: Vec<f32> = arr.iter().filter_map(|o| number(resolve(doc, o))).collect();
            if values.len() == 4 {
                return [
                    values[0].min(values[2]),
                    values[1].min(values[3]),
                    values[0].max(values[2]),
                    values[1].max(values[3]),
                ];
            }
        }

        if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent")
            && let Ok(parent) = doc.get_object(*parent_id)
        {
            return media_box_recursive(doc, parent, depth - 1);
        }
    }

    DEFAULT_MEDIA_BOX
}

/// Effective Resources dictionary of a page (inline, referenced or inherited)
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..10 {
        if let Ok(resources) = node.get(b"Resources") {
            return match resolve(doc, resources) {
                Object::Dictionary(dict) => Some(dict.clone()),
                _ => None,
            };
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Sub-dictionary of a resources dictionary (`Font`, `XObject`, ...)
pub(crate) fn resource_category(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key).map(|o| resolve(doc, o)) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8, else Latin-1
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}
