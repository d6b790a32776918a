/*!
 * Fonts written into output documents.
 *
 * Two kinds are supported:
 * - the base-14 Helvetica family with `WinAnsiEncoding`, which needs no
 *   font program and covers Latin-1 plus the Windows-1252 extras;
 * - an embedded TrueType font (`Type0` / `CIDFontType2`, `Identity-H`)
 *   loaded from a file, needed for scripts such as Devanagari.
 *
 * Text is checked against the chosen font before anything is written; a
 * character without a glyph fails the run instead of printing as `?`.
 */

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::PdfError;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

/// Characters of Windows-1252 outside Latin-1
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

/// Member of the Helvetica family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Regular,
    Bold,
    Oblique,
    BoldOblique,
}

impl StandardFont {
    pub fn for_style(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Self::Regular,
            (true, false) => Self::Bold,
            (false, true) => Self::Oblique,
            (true, true) => Self::BoldOblique,
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
            Self::Oblique => "Helvetica-Oblique",
            Self::BoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Name under which the font is registered in page resources
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Regular => "FTr",
            Self::Bold => "FTrB",
            Self::Oblique => "FTrI",
            Self::BoldOblique => "FTrBI",
        }
    }

    pub fn is_bold(&self) -> bool {
        matches!(self, Self::Bold | Self::BoldOblique)
    }

    /// Font dictionary for this base-14 font
    pub fn dictionary(&self) -> Dictionary {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => self.base_font(),
            "Encoding" => "WinAnsiEncoding",
        }
    }

    /// Advance width of `text` in points
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let scale = if self.is_bold() { 1.05 } else { 1.0 };
        let units: u32 = text.chars().map(|c| u32::from(helvetica_width(c))).sum();
        units as f32 / 1000.0 * font_size * scale
    }
}

/// Helvetica advance of one character in 1/1000 em
pub fn helvetica_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_WIDTHS[c as usize - 32],
        _ => DEFAULT_WIDTH,
    }
}

/// Windows-1252 code of `c`, if it has one
pub fn win_ansi_code(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u32 as u8),
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, code)| *code),
    }
}

/// Encode `text` for a `WinAnsiEncoding` font.
///
/// Returns the bytes and how many characters had to be replaced with `?`.
pub fn encode_win_ansi(text: &str) -> (Vec<u8>, usize) {
    let mut replaced = 0;
    let bytes = text
        .chars()
        .map(|c| match c {
            '\t' => b' ',
            _ => win_ansi_code(c).unwrap_or_else(|| {
                replaced += 1;
                b'?'
            }),
        })
        .collect();
    (bytes, replaced)
}

/// A TrueType font program embedded as a CID font
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    /// Raw font program
    data: Vec<u8>,
    /// PostScript-safe name used for BaseFont
    name: String,
    units_per_em: f32,
    ascent: i16,
    descent: i16,
}

impl EmbeddedFont {
    /// Resource name used on every page
    pub const RESOURCE_NAME: &'static str = "FTrU";

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| PdfError::LayoutRewrite(format!("Cannot read font {}: {}", path.display(), e)))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "EmbeddedFont".to_string());
        Self::from_bytes(data, &name)
    }

    pub fn from_bytes(data: Vec<u8>, name: &str) -> Result<Self, PdfError> {
        let (units_per_em, ascent, descent) = {
            let face = ttf_parser::Face::parse(&data, 0)
                .map_err(|e| PdfError::LayoutRewrite(format!("Invalid font program: {}", e)))?;
            (face.units_per_em(), face.ascender(), face.descender())
        };
        if units_per_em == 0 {
            return Err(PdfError::LayoutRewrite("Font has zero units per em".to_string()));
        }

        let name: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();

        Ok(Self {
            data,
            name: if name.is_empty() { "EmbeddedFont".to_string() } else { name },
            units_per_em: f32::from(units_per_em),
            ascent,
            descent,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0).ok()
    }

    /// Glyph id and advance (font units) for every character of `text`;
    /// characters without a glyph map to `?` or glyph 0
    pub fn glyphs(&self, text: &str) -> Vec<(char, u16, u16)> {
        let Some(face) = self.face() else {
            return Vec::new();
        };
        let fallback = face.glyph_index('?').map(|g| g.0).unwrap_or(0);

        text.chars()
            .map(|c| {
                let c = if c == '\t' { ' ' } else { c };
                let gid = face.glyph_index(c).map(|g| g.0).unwrap_or(fallback);
                let advance = face
                    .glyph_hor_advance(ttf_parser::GlyphId(gid))
                    .unwrap_or(0);
                (c, gid, advance)
            })
            .collect()
    }

    /// Non-whitespace characters of `text` without a glyph, in order
    pub fn missing(&self, text: &str) -> Vec<char> {
        let Some(face) = self.face() else {
            return text.chars().filter(|c| !c.is_whitespace()).collect();
        };
        text.chars()
            .filter(|c| !c.is_whitespace() && face.glyph_index(*c).is_none())
            .collect()
    }

    /// Whether every character of `text` has a glyph
    pub fn covers(&self, text: &str) -> bool {
        self.missing(text).is_empty()
    }

    /// Advance width of `text` in points
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = self.glyphs(text).iter().map(|(_, _, adv)| u32::from(*adv)).sum();
        units as f32 / self.units_per_em * font_size
    }

    /// Two-byte glyph ids for an `Identity-H` string
    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.glyphs(text)
            .iter()
            .flat_map(|(_, gid, _)| gid.to_be_bytes())
            .collect()
    }

    fn scaled(&self, units: i32) -> i64 {
        (units as f32 * 1000.0 / self.units_per_em).round() as i64
    }

    /// Add the font program and its dictionaries to `doc`.
    ///
    /// `used_text` decides which glyphs get widths and ToUnicode entries.
    pub fn embed(&self, doc: &mut Document, used_text: &str) -> Result<ObjectId, PdfError> {
        let mut used: BTreeMap<u16, (char, u16)> = BTreeMap::new();
        for (c, gid, advance) in self.glyphs(used_text) {
            used.entry(gid).or_insert((c, advance));
        }

        let font_file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.clone(),
        ));

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.name.as_bytes().to_vec()),
            "Flags" => 32,
            "FontBBox" => vec![
                Object::Integer(-500),
                Object::Integer(self.scaled(i32::from(self.descent))),
                Object::Integer(1500),
                Object::Integer(self.scaled(i32::from(self.ascent))),
            ],
            "ItalicAngle" => 0,
            "Ascent" => self.scaled(i32::from(self.ascent)),
            "Descent" => self.scaled(i32::from(self.descent)),
            "CapHeight" => self.scaled(i32::from(self.ascent)),
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let mut widths = Vec::with_capacity(used.len() * 2);
        for (gid, (_, advance)) in &used {
            widths.push(Object::Integer(i64::from(*gid)));
            widths.push(Object::Array(vec![Object::Integer(self.scaled(i32::from(*advance)))]));
        }

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(self.name.as_bytes().to_vec()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(
            Dictionary::new(),
            to_unicode_cmap(&used).into_bytes(),
        ));

        Ok(doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(self.name.as_bytes().to_vec()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        }))
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, (char, u16)>) -> String {
    let entries: Vec<(u16, char)> = used.iter().map(|(gid, (c, _))| (*gid, *c)).collect();

    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n");
    out.push_str("12 dict begin\n");
    out.push_str("begincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n");
    out.push_str("/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, c) in chunk {
            let mut units = [0u16; 2];
            let hex: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            out.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\n");
    out.push_str("CMapName currentdict /CMap defineresource pop\n");
    out.push_str("end\nend\n");
    out
}

/// Font choice for one rewrite or reflow run
#[derive(Debug, Clone)]
pub enum FontSet {
    /// Helvetica family, one member per style
    Standard,
    /// One embedded font for every style; bold and italic are simulated
    Embedded(EmbeddedFont),
}

impl FontSet {
    /// Embedded font from `path`, Helvetica when no path is set
    pub fn from_path(path: Option<&str>) -> Result<Self, PdfError> {
        match path {
            Some(path) if !path.trim().is_empty() => Ok(Self::Embedded(EmbeddedFont::from_file(path)?)),
            _ => Ok(Self::Standard),
        }
    }

    /// Fail when some character of `text` has no glyph in this font set
    pub fn ensure_covers(&self, text: &str) -> Result<(), PdfError> {
        let missing: Vec<char> = match self {
            Self::Standard => text
                .chars()
                .filter(|c| !c.is_whitespace() && win_ansi_code(*c).is_none())
                .collect(),
            Self::Embedded(font) => font.missing(text),
        };
        let Some(first) = missing.first() else {
            return Ok(());
        };

        let font = match self {
            Self::Standard => "Helvetica".to_string(),
            Self::Embedded(font) => font.name().to_string(),
        };
        Err(PdfError::LayoutRewrite(format!(
            "{} character(s) such as '{}' have no glyph in {}; configure a Unicode TrueType font (rendering.font_path or --font)",
            missing.len(),
            first,
            font
        )))
    }

    /// Resource name for a style
    pub fn resource_name(&self, bold: bool, italic: bool) -> &'static str {
        match self {
            Self::Standard => StandardFont::for_style(bold, italic).resource_name(),
            Self::Embedded(_) => EmbeddedFont::RESOURCE_NAME,
        }
    }

    pub fn text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool) -> f32 {
        match self {
            Self::Standard => StandardFont::for_style(bold, italic).text_width(text, font_size),
            Self::Embedded(font) => font.text_width(text, font_size),
        }
    }

    /// String bytes for a `Tj` operand
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Standard => encode_win_ansi(text).0,
            Self::Embedded(font) => font.encode(text),
        }
    }

    /// Add the needed font objects to `doc` and return `(resource name, object)` pairs
    pub fn install(
        &self,
        doc: &mut Document,
        styles: &[(bool, bool)],
        used_text: &str,
    ) -> Result<Vec<(&'static str, ObjectId)>, PdfError> {
        match self {
            Self::Standard => {
                let mut members: Vec<StandardFont> = styles
                    .iter()
                    .map(|(bold, italic)| StandardFont::for_style(*bold, *italic))
                    .collect();
                members.sort();
                members.dedup();
                Ok(members
                    .into_iter()
                    .map(|font| (font.resource_name(), doc.add_object(font.dictionary())))
                    .collect())
            }
            Self::Embedded(font) => Ok(vec![(EmbeddedFont::RESOURCE_NAME, font.embed(doc, used_text)?)]),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded(_))
    }
}

/// Folders searched by [`find_system_font`]
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = [
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "/Library/Fonts",
        "/System/Library/Fonts",
        "C:\\Windows\\Fonts",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(Path::new(&home).join(".fonts"));
        dirs.push(Path::new(&home).join(".local/share/fonts"));
    }
    dirs
}

/// First TrueType file under `dirs` with a glyph for every character of
/// `sample`, in file name order
pub fn find_font_in(dirs: &[PathBuf], sample: &str) -> Option<PathBuf> {
    dirs.iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| {
            WalkDir::new(dir)
                .max_depth(4)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
        })
        .find(|entry| match EmbeddedFont::from_file(entry.path()) {
            Ok(font) => font.covers(sample),
            Err(e) => {
                debug!("Skipping font {}: {}", entry.path().display(), e);
                false
            }
        })
        .map(|entry| entry.into_path())
}

/// Installed TrueType font able to show `sample`
pub fn find_system_font(sample: &str) -> Option<PathBuf> {
    find_font_in(&system_font_dirs(), sample)
}
