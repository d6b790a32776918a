/*!
 * Layout-preserving rewrite of a document with translated block texts.
 *
 * Every translated block is painted over with a white rectangle (its box
 * extended downward by a margin) and the translation is written inside the
 * box, word-wrapped to the box width. The original page content is left in
 * place under the overlay and wrapped in `q`/`Q` so that its graphics state
 * cannot leak into the overlay. When enabled, the overlay is marked as an
 * optional content group that viewers can toggle.
 */

use log::{debug, warn};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, Stream, dictionary};
use std::collections::BTreeMap;

use crate::app_config::RenderingConfig;
use crate::errors::PdfError;
use crate::pdf::fonts::FontSet;
use crate::pdf::{TextBlock, load, media_box, page_ids, page_resources, resource_category};

/// Smallest and largest font size used for translated text
pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 24.0;

/// Line height as a multiple of the font size
pub const LINE_SPACING: f32 = 1.2;

/// Property name of the optional content group in page resources
const OCG_PROPERTY: &str = "OCtr";

/// Settings of one rewrite run
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteOptions {
    /// Mark the overlay as a toggleable optional content group
    pub ocg_layer: bool,
    pub layer_name: String,
    /// Size used when a block has no usable size
    pub default_font_size: f32,
    /// Extra points cleared below each block box
    pub box_bottom_margin: f32,
    /// TrueType font to embed instead of Helvetica
    pub font_path: Option<String>,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::from(&RenderingConfig::default())
    }
}

impl From<&RenderingConfig> for RewriteOptions {
    fn from(config: &RenderingConfig) -> Self {
        Self {
            ocg_layer: config.ocg_layer,
            layer_name: config.layer_name.clone(),
            default_font_size: config.default_font_size,
            box_bottom_margin: config.box_bottom_margin,
            font_path: config.font_path.clone(),
        }
    }
}

/// One block ready to be drawn, in PDF user space
#[derive(Debug, Clone)]
struct Placement {
    rect: [f32; 4],
    text_x: f32,
    first_baseline: f32,
    font_size: f32,
    lines: Vec<String>,
    bold: bool,
    italic: bool,
    color: [f32; 3],
}

fn rewrite_error(context: &str, e: impl std::fmt::Display) -> PdfError {
    PdfError::LayoutRewrite(format!("{}: {}", context, e))
}

/// Replace the text of `blocks` with `translated`, position for position.
///
/// Blocks beyond the end of `translated` and blank translations are left
/// untouched. Any failure yields `PdfError::LayoutRewrite`; no partially
/// rewritten document is returned.
pub fn rewrite(
    original: &[u8],
    blocks: &[TextBlock],
    translated: &[String],
    options: &RewriteOptions,
) -> Result<Vec<u8>, PdfError> {
    let mut doc = load(original).map_err(|e| rewrite_error("Cannot load document", e))?;
    let pages = page_ids(&doc);

    let mut by_page: BTreeMap<usize, Vec<(&TextBlock, &str)>> = BTreeMap::new();
    for (block, text) in blocks.iter().zip(translated) {
        if text.trim().is_empty() {
            continue;
        }
        if block.page_index >= pages.len() {
            warn!(
                "Block {} refers to page {} of a {}-page document; skipped",
                block.order_index,
                block.page_index + 1,
                pages.len()
            );
            continue;
        }
        by_page.entry(block.page_index).or_default().push((block, text.as_str()));
    }

    let fonts = FontSet::from_path(options.font_path.as_deref())?;
    let mut styles: Vec<(bool, bool)> = by_page
        .values()
        .flatten()
        .map(|(b, _)| (b.style.bold, b.style.italic))
        .collect();
    styles.sort();
    styles.dedup();
    let used_text: String = by_page.values().flatten().map(|(_, t)| *t).collect();
    fonts.ensure_covers(&used_text)?;

    let installed = if by_page.is_empty() {
        Vec::new()
    } else {
        fonts.install(&mut doc, &styles, &used_text)?
    };

    let ocg_id = if options.ocg_layer && !by_page.is_empty() {
        Some(register_layer(&mut doc, &options.layer_name)?)
    } else {
        None
    };

    for (page_index, entries) in &by_page {
        let page_id = pages[*page_index];
        let mb = media_box(&doc, page_id);

        let placements: Vec<Placement> = entries
            .iter()
            .map(|(block, text)| place_block(block, text, mb, &fonts, options))
            .collect();
        let overlay = overlay_content(&placements, &fonts, ocg_id.is_some())?;

        install_resources(&mut doc, page_id, &installed, ocg_id)?;
        append_overlay(&mut doc, page_id, overlay)?;
        debug!("Page {}: {} block(s) rewritten", page_index + 1, placements.len());
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| rewrite_error("Failed to save document", e))?;
    Ok(output)
}

/// Wrap `text` to `max_width`, keeping explicit line breaks.
///
/// Words are never split; a word wider than the box gets its own line.
pub fn word_wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let space_width = measure(" ");
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = measure(word);
            if current.is_empty() {
                current = word.to_string();
                current_width = word_width;
            } else if current_width + space_width + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space_width + word_width;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
                current_width = word_width;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn place_block(block: &TextBlock, text: &str, mb: [f32; 4], fonts: &FontSet, options: &RewriteOptions) -> Placement {
    let base_size = if block.style.font_size > 0.0 {
        block.style.font_size
    } else {
        options.default_font_size
    };
    let mut font_size = base_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);

    let x = mb[0] + block.bbox.x0;
    let top = mb[3] - block.bbox.y0;
    let bottom = mb[3] - (block.bbox.y1 + options.box_bottom_margin);
    let width = block.bbox.width().max(1.0);
    let (bold, italic) = (block.style.bold, block.style.italic);

    let wrap = |size: f32| word_wrap(text, width, |s| fonts.text_width(s, size, bold, italic));
    let mut lines = wrap(font_size);

    // Shrink until the text stays above the page bottom
    let available = (top - mb[1]).max(0.0);
    while font_size > MIN_FONT_SIZE && lines.len() as f32 * font_size * LINE_SPACING > available {
        font_size = (font_size - 1.0).max(MIN_FONT_SIZE);
        lines = wrap(font_size);
    }

    Placement {
        rect: [x, bottom, width, (top - bottom).max(0.0)],
        text_x: x,
        first_baseline: top - font_size,
        font_size,
        lines,
        bold,
        italic,
        color: block.style.color.unwrap_or([0.0, 0.0, 0.0]),
    }
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn overlay_content(placements: &[Placement], fonts: &FontSet, marked: bool) -> Result<Vec<u8>, PdfError> {
    let mut ops = Vec::new();
    if marked {
        ops.push(Operation::new(
            "BDC",
            vec![Object::Name(b"OC".to_vec()), Object::Name(OCG_PROPERTY.as_bytes().to_vec())],
        ));
    }
    ops.push(Operation::new("q", vec![]));

    for placement in placements {
        let [x, y, w, h] = placement.rect;
        ops.push(Operation::new("rg", vec![real(1.0), real(1.0), real(1.0)]));
        ops.push(Operation::new("re", vec![real(x), real(y), real(w), real(h)]));
        ops.push(Operation::new("f", vec![]));

        let [r, g, b] = placement.color;
        ops.push(Operation::new("rg", vec![real(r), real(g), real(b)]));

        // Embedded fonts have a single face: stroke for bold, skew for italic
        let fake_bold = fonts.is_embedded() && placement.bold;
        let fake_italic = fonts.is_embedded() && placement.italic;
        if fake_bold {
            ops.push(Operation::new("RG", vec![real(r), real(g), real(b)]));
            ops.push(Operation::new("w", vec![real(placement.font_size * 0.03)]));
            ops.push(Operation::new("Tr", vec![Object::Integer(2)]));
        } else {
            ops.push(Operation::new("Tr", vec![Object::Integer(0)]));
        }

        let font_name = fonts.resource_name(placement.bold, placement.italic);
        for (j, line) in placement.lines.iter().enumerate() {
            let baseline = placement.first_baseline - j as f32 * placement.font_size * LINE_SPACING;
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new(
                "Tf",
                vec![Object::Name(font_name.as_bytes().to_vec()), real(placement.font_size)],
            ));
            if fake_italic {
                ops.push(Operation::new(
                    "Tm",
                    vec![real(1.0), real(0.0), real(0.2), real(1.0), real(placement.text_x), real(baseline)],
                ));
            } else {
                ops.push(Operation::new("Td", vec![real(placement.text_x), real(baseline)]));
            }
            let format = if fonts.is_embedded() {
                StringFormat::Hexadecimal
            } else {
                StringFormat::Literal
            };
            ops.push(Operation::new("Tj", vec![Object::String(fonts.encode(line), format)]));
            ops.push(Operation::new("ET", vec![]));
        }

        if fake_bold {
            ops.push(Operation::new("Tr", vec![Object::Integer(0)]));
        }
    }

    ops.push(Operation::new("Q", vec![]));
    if marked {
        ops.push(Operation::new("EMC", vec![]));
    }

    Content { operations: ops }
        .encode()
        .map_err(|e| rewrite_error("Failed to encode overlay", e))
}

/// Create the optional content group and list it in the catalog
fn register_layer(doc: &mut Document, name: &str) -> Result<ObjectId, PdfError> {
    let ocg_id = doc.add_object(dictionary! {
        "Type" => "OCG",
        "Name" => Object::string_literal(name),
    });

    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| rewrite_error("No document catalog", e))?;

    let mut properties = match doc.get_dictionary(catalog_id)
        .map_err(|e| rewrite_error("Invalid document catalog", e))?
        .get(b"OCProperties")
    {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };

    let mut ocgs = array_entry(doc, &properties, b"OCGs");
    ocgs.push(Object::Reference(ocg_id));
    properties.set("OCGs", ocgs);

    let mut default_config = match properties.get(b"D") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).cloned().unwrap_or_default(),
        _ => Dictionary::new(),
    };
    let mut on = array_entry(doc, &default_config, b"ON");
    on.push(Object::Reference(ocg_id));
    default_config.set("ON", on);
    let mut order = array_entry(doc, &default_config, b"Order");
    order.push(Object::Reference(ocg_id));
    default_config.set("Order", order);
    properties.set("D", default_config);

    let catalog = doc
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| rewrite_error("Invalid document catalog", e))?;
    catalog.set("OCProperties", properties);

    Ok(ocg_id)
}

fn array_entry(doc: &Document, dict: &Dictionary, key: &[u8]) -> Vec<Object> {
    match dict.get(key) {
        Ok(Object::Array(items)) => items.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Give the page an inline Resources dictionary holding the overlay fonts
/// and the layer property next to everything it already used
fn install_resources(
    doc: &mut Document,
    page_id: ObjectId,
    fonts: &[(&'static str, ObjectId)],
    ocg_id: Option<ObjectId>,
) -> Result<(), PdfError> {
    let mut resources = page_resources(doc, page_id).unwrap_or_default();

    let mut font_dict = resource_category(doc, &resources, b"Font");
    for (name, id) in fonts {
        font_dict.set(*name, Object::Reference(*id));
    }
    resources.set("Font", font_dict);

    if let Some(ocg_id) = ocg_id {
        let mut properties = resource_category(doc, &resources, b"Properties");
        properties.set(OCG_PROPERTY, Object::Reference(ocg_id));
        resources.set("Properties", properties);
    }

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| rewrite_error("Invalid page object", e))?;
    page.set("Resources", resources);
    Ok(())
}

/// Contents becomes `[q, original..., Q, overlay]`
fn append_overlay(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<(), PdfError> {
    let existing = doc
        .get_dictionary(page_id)
        .map_err(|e| rewrite_error("Invalid page object", e))?
        .get(b"Contents")
        .ok()
        .cloned();

    let mut original = match existing {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        _ => Vec::new(),
    };

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(original.len() + 3);
    contents.push(Object::Reference(save_id));
    contents.append(&mut original);
    contents.push(Object::Reference(restore_id));
    contents.push(Object::Reference(overlay_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| rewrite_error("Invalid page object", e))?;
    page.set("Contents", Object::Array(contents));
    Ok(())
}
