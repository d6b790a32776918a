/*!
 * Plain flowing-text document, used when the layout rewrite fails.
 *
 * The text is laid out top to bottom on pages of the original's first page
 * size. Lines are wrapped by character count with a fixed average character
 * width, so the result is readable rather than faithful.
 */

use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat, Stream, dictionary};

use crate::app_config::RenderingConfig;
use crate::errors::PdfError;
use crate::pdf::fonts::FontSet;
use crate::pdf::{load, media_box, page_ids};

/// A4 in points
pub const A4: (f32, f32) = (595.28, 841.89);

const FONT_SIZE: f32 = 12.0;
/// Average glyph width relative to the font size
const CHAR_WIDTH_FACTOR: f32 = 0.6;

/// Layout settings of the reflow writer
#[derive(Debug, Clone, PartialEq)]
pub struct ReflowOptions {
    pub margin: f32,
    pub line_height: f32,
    pub font_size: f32,
    /// TrueType font to embed instead of Helvetica
    pub font_path: Option<String>,
}

impl Default for ReflowOptions {
    fn default() -> Self {
        Self {
            margin: 50.0,
            line_height: 16.0,
            font_size: FONT_SIZE,
            font_path: None,
        }
    }
}

impl From<&RenderingConfig> for ReflowOptions {
    fn from(config: &RenderingConfig) -> Self {
        Self {
            margin: config.reflow_margin,
            line_height: config.reflow_line_height,
            font_size: FONT_SIZE,
            font_path: config.font_path.clone(),
        }
    }
}

/// Write `text` into a new document with default settings
pub fn reflow(text: &str, original: Option<&[u8]>) -> Result<Vec<u8>, PdfError> {
    reflow_with_options(text, original, &ReflowOptions::default())
}

/// Page size of the original's first page, A4 when unavailable
pub fn page_size(original: Option<&[u8]>) -> (f32, f32) {
    let Some(bytes) = original else {
        return A4;
    };
    let Ok(doc) = load(bytes) else {
        return A4;
    };
    match page_ids(&doc).first() {
        Some(id) => {
            let mb = media_box(&doc, *id);
            (mb[2] - mb[0], mb[3] - mb[1])
        }
        None => A4,
    }
}

/// Wrap one line to at most `max_chars` characters, splitting on whitespace.
///
/// A word longer than `max_chars` stays whole on its own line.
pub fn wrap_chars(line: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lines placed on each page as `(text, baseline from the top)`
fn paginate(text: &str, height: f32, max_chars: usize, options: &ReflowOptions) -> Vec<Vec<(String, f32)>> {
    let mut pages: Vec<Vec<(String, f32)>> = vec![Vec::new()];
    let mut y = options.margin;

    for line in text.split('\n') {
        if line.trim().is_empty() {
            y += options.line_height;
            continue;
        }
        for wrapped in wrap_chars(line, max_chars) {
            if y > height - options.margin {
                pages.push(Vec::new());
                y = options.margin;
            }
            if let Some(page) = pages.last_mut() {
                page.push((wrapped, y));
            }
            y += options.line_height;
        }
    }

    pages
}

/// Write `text` into a new document.
///
/// An empty text gives one blank page.
pub fn reflow_with_options(text: &str, original: Option<&[u8]>, options: &ReflowOptions) -> Result<Vec<u8>, PdfError> {
    let (width, height) = page_size(original);
    let char_width = options.font_size * CHAR_WIDTH_FACTOR;
    let max_chars = (((width - 2.0 * options.margin) / char_width).floor() as usize).max(1);
    let pages = paginate(text, height, max_chars, options);

    let fonts = FontSet::from_path(options.font_path.as_deref())?;
    fonts.ensure_covers(text)?;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let installed = fonts.install(&mut doc, &[(false, false)], text)?;
    let font_name = fonts.resource_name(false, false);

    let mut font_dict = lopdf::Dictionary::new();
    for (name, id) in &installed {
        font_dict.set(*name, *id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => font_dict });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in &pages {
        let content_id = page_content(&mut doc, lines, &fonts, font_name, height, options)?;
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Resources" => resources_id,
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
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    debug!("Reflowed {} character(s) onto {} page(s)", text.chars().count(), pages.len());

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| PdfError::LayoutRewrite(format!("Failed to save reflowed document: {}", e)))?;
    Ok(output)
}

fn page_content(
    doc: &mut Document,
    lines: &[(String, f32)],
    fonts: &FontSet,
    font_name: &str,
    height: f32,
    options: &ReflowOptions,
) -> Result<ObjectId, PdfError> {
    let format = if fonts.is_embedded() {
        StringFormat::Hexadecimal
    } else {
        StringFormat::Literal
    };

    let mut operations = Vec::with_capacity(lines.len() * 5);
    for (line, top) in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![font_name.into(), Object::Real(options.font_size)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(options.margin), Object::Real(height - top)],
        ));
        operations.push(Operation::new("Tj", vec![Object::String(fonts.encode(line), format)]));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations }
        .encode()
        .map_err(|e| PdfError::LayoutRewrite(format!("Failed to encode page content: {}", e)))?;
    Ok(doc.add_object(Stream::new(lopdf::Dictionary::new(), content)))
}
