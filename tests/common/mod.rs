/*!
 * Common test utilities for the pdftrans test suite
 */

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use pdftrans::app_config::{Config, TranslationDirection};
use pdftrans::errors::ProviderError;
use pdftrans::pdf::BBox;
use pdftrans::providers::TranslationProvider;
use pdftrans::providers::mock::{MockProvider, MockRequest};
use pdftrans::translation::{Orchestrator, RetryPolicy};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes `bytes` to `dir/filename`
pub fn create_test_file(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, bytes)?;
    Ok(file_path)
}

/// One line of text drawn at a baseline, in PDF user space
pub struct TextLine<'a> {
    pub x: i64,
    pub baseline: i64,
    pub size: i64,
    pub text: &'a str,
}

impl<'a> TextLine<'a> {
    pub fn new(x: i64, baseline: i64, size: i64, text: &'a str) -> Self {
        Self { x, baseline, size, text }
    }
}

/// Document builder for in-memory fixtures
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
    media_box: [i64; 4],
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
            media_box: [0, 0, 612, 792],
        }
    }

    pub fn media_box(mut self, width: i64, height: i64) -> Self {
        self.media_box = [0, 0, width, height];
        self
    }

    /// Add a page showing `lines` in Helvetica
    pub fn text_page(mut self, lines: &[TextLine<'_>]) -> Self {
        let mut operations = Vec::new();
        for line in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), line.size.into()]));
            operations.push(Operation::new("Td", vec![line.x.into(), line.baseline.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let resources = dictionary! { "Font" => dictionary! { "F1" => self.font_id } };
        self.add_page(operations, resources)
    }

    /// Add a page painting one image XObject and no text
    pub fn image_page(mut self) -> Self {
        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 2,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0, 255, 255, 0],
        ));
        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![200.into(), 0.into(), 0.into(), 200.into(), 100.into(), 400.into()]),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ];
        let resources = dictionary! { "XObject" => dictionary! { "Im0" => image_id } };
        self.add_page(operations, resources)
    }

    fn add_page(mut self, operations: Vec<Operation>, resources: Dictionary) -> Self {
        let content = Content { operations }.encode().expect("content encodes");
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        let [x0, y0, x1, y1] = self.media_box;
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![x0.into(), y0.into(), x1.into(), y1.into()],
        });
        self.kids.push(page_id.into());
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Test Suite"),
        });
        self.doc.trailer.set("Info", info_id);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes).expect("document saves");
        bytes
    }
}

/// One-page document with a single block whose top-left box is (50,50,200,70)
pub fn single_block_pdf(text: &str) -> Vec<u8> {
    // Baseline 730 from the bottom of a 792pt page is 62pt from the top
    PdfBuilder::new().text_page(&[TextLine::new(50, 730, 12, text)]).build()
}

/// Document whose only page holds an image
pub fn image_only_pdf() -> Vec<u8> {
    PdfBuilder::new().image_page().build()
}

/// Three pages with one heading and one paragraph each
pub fn multi_page_pdf() -> Vec<u8> {
    let mut builder = PdfBuilder::new();
    for heading in ["Introduction", "Methods", "Results"] {
        builder = builder.text_page(&[
            TextLine::new(72, 720, 18, heading),
            TextLine::new(72, 680, 11, "The system reads every page."),
            TextLine::new(72, 666, 11, "Each block keeps its position."),
        ]);
    }
    builder.title("Quarterly Report").build()
}

/// Default configuration plus an English to French direction, the
/// default pair. French renders in Helvetica, so runs need no font file.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config
        .directions
        .push(TranslationDirection::new("English to French", "en", "fr"));
    config.target_language = "fr".to_string();
    config
}

/// Orchestrator over a shared mock provider, without pacing delays
pub fn mock_orchestrator(provider: MockProvider) -> Orchestrator {
    let factory = move |_: &str, _: &str| -> Result<Arc<dyn TranslationProvider>, ProviderError> {
        Ok(Arc::new(provider.clone()))
    };
    Orchestrator::new(Arc::new(factory))
        .with_directions(test_config().directions)
        .with_retry_policy(RetryPolicy::immediate(3))
}

/// Word-by-word English to Hindi replacement, unknown words kept
pub fn hindi_dictionary(request: &MockRequest) -> String {
    request
        .text
        .split_whitespace()
        .map(|word| match word.trim_end_matches('.').to_lowercase().as_str() {
            "please" => "कृपया",
            "open" => "खोलें",
            "the" => "",
            "file" => "फ़ाइल",
            "using" => "का उपयोग करके",
            "of" => "के",
            "tool" => "उपकरण",
            "hello" => "नमस्ते",
            "world" => "दुनिया",
            _ => word,
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercases the request, readable in Helvetica output
pub fn shouting(request: &MockRequest) -> String {
    request.text.to_uppercase()
}

/// Words of each page in content-stream order, with top-left boxes
///
/// The rewrite leaves the original text under the overlay, so reading
/// order by position can mix the two; stream order keeps them apart.
pub fn content_words(bytes: &[u8]) -> Result<Vec<Vec<(String, BBox)>>> {
    let pdf = pdfplumber::Pdf::open(bytes, None).map_err(|e| anyhow::anyhow!("{}", e))?;
    let options = pdfplumber::WordOptions {
        use_text_flow: true,
        ..Default::default()
    };
    let mut pages = Vec::with_capacity(pdf.page_count());
    for index in 0..pdf.page_count() {
        let page = pdf.page(index).map_err(|e| anyhow::anyhow!("{}", e))?;
        pages.push(
            page.extract_words(&options)
                .into_iter()
                .map(|w| {
                    let b = w.bbox;
                    (w.text, BBox::new(b.x0 as f32, b.top as f32, b.x1 as f32, b.bottom as f32))
                })
                .collect(),
        );
    }
    Ok(pages)
}

/// Document words in content-stream order joined by single spaces
///
/// Translations are wrapped to the width of the original block, so
/// multi-word assertions compare flattened text.
pub fn flat_text(bytes: &[u8]) -> Result<String> {
    Ok(content_words(bytes)?
        .into_iter()
        .flatten()
        .map(|(text, _)| text)
        .collect::<Vec<_>>()
        .join(" "))
}
