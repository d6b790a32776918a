/*!
 * Tests for block extraction, document info and image listing
 */

use anyhow::Result;
use pdftrans::errors::PdfError;
use pdftrans::pdf;

use crate::common::{self, PdfBuilder, TextLine};

#[test]
fn test_extract_withMultiPageDocument_shouldKeepPageAndReadingOrder() -> Result<()> {
    let bytes = common::multi_page_pdf();

    let blocks = pdf::extract(&bytes)?;

    assert_eq!(blocks.len(), 6);
    let pages: Vec<usize> = blocks.iter().map(|b| b.page_index).collect();
    assert_eq!(pages, vec![0, 0, 1, 1, 2, 2]);
    let orders: Vec<usize> = blocks.iter().map(|b| b.order_index).collect();
    assert_eq!(orders, (0..6).collect::<Vec<_>>());

    assert_eq!(blocks[0].text, "Introduction");
    assert_eq!(
        blocks[1].text,
        "The system reads every page.\nEach block keeps its position."
    );
    assert_eq!(blocks[2].text, "Methods");
    Ok(())
}

#[test]
fn test_extract_shouldNeverReturnBlankBlocks() -> Result<()> {
    let bytes = PdfBuilder::new()
        .text_page(&[
            TextLine::new(50, 700, 12, "   "),
            TextLine::new(50, 600, 12, "Visible"),
        ])
        .build();

    let blocks = pdf::extract(&bytes)?;

    assert_eq!(blocks.len(), 1);
    assert!(blocks.iter().all(|b| !b.text.trim().is_empty()));
    Ok(())
}

#[test]
fn test_extract_shouldProduceNormalizedTopLeftBoxes() -> Result<()> {
    let bytes = common::multi_page_pdf();

    for block in pdf::extract(&bytes)? {
        assert!(block.bbox.x1 >= block.bbox.x0);
        assert!(block.bbox.y1 >= block.bbox.y0);
        // Every fixture line sits in the upper part of the page
        assert!(block.bbox.y0 < 200.0, "unexpected box {:?}", block.bbox);
    }
    Ok(())
}

#[test]
fn test_extract_shouldCarryDominantFontSize() -> Result<()> {
    let blocks = pdf::extract(&common::multi_page_pdf())?;

    assert!((blocks[0].style.font_size - 18.0).abs() < 0.01);
    assert!((blocks[1].style.font_size - 11.0).abs() < 0.01);
    Ok(())
}

#[test]
fn test_extract_shouldNotMutateInput() -> Result<()> {
    let bytes = common::single_block_pdf("Hello world");
    let copy = bytes.clone();

    pdf::extract(&bytes)?;
    pdf::get_info(&bytes)?;

    assert_eq!(bytes, copy);
    Ok(())
}

#[test]
fn test_hasExtractableText_withImageOnlyDocument_shouldBeFalse() -> Result<()> {
    let bytes = common::image_only_pdf();

    assert!(!pdf::has_extractable_text(&bytes)?);
    assert!(pdf::extract(&bytes)?.is_empty());
    Ok(())
}

#[test]
fn test_hasExtractableText_withText_shouldBeTrue() -> Result<()> {
    assert!(pdf::has_extractable_text(&common::single_block_pdf("Hello"))?);
    Ok(())
}

#[test]
fn test_extractPlainText_shouldSeparatePagesWithBlankLine() -> Result<()> {
    let bytes = PdfBuilder::new()
        .text_page(&[TextLine::new(50, 700, 12, "First page")])
        .text_page(&[TextLine::new(50, 700, 12, "Second page")])
        .build();

    assert_eq!(pdf::extract_plain_text(&bytes)?, "First page\n\nSecond page");
    Ok(())
}

#[test]
fn test_getInfo_shouldReadPageSizeAndMetadata() -> Result<()> {
    let bytes = common::multi_page_pdf();

    let info = pdf::get_info(&bytes)?;

    assert_eq!(info.page_count, 3);
    assert_eq!(info.byte_size, bytes.len());
    assert_eq!((info.page_width, info.page_height), (612.0, 792.0));
    assert!(!info.encrypted);
    assert_eq!(info.metadata.get("Title").map(String::as_str), Some("Quarterly Report"));
    assert_eq!(info.metadata.get("Author").map(String::as_str), Some("Test Suite"));
    Ok(())
}

#[test]
fn test_getInfo_withCustomMediaBox_shouldReportIt() -> Result<()> {
    let bytes = PdfBuilder::new()
        .media_box(420, 595)
        .text_page(&[TextLine::new(20, 500, 10, "A5 page")])
        .build();

    let info = pdf::get_info(&bytes)?;

    assert_eq!((info.page_width, info.page_height), (420.0, 595.0));
    Ok(())
}

#[test]
fn test_extractImagesInfo_shouldListImageXObjects() -> Result<()> {
    let bytes = PdfBuilder::new()
        .text_page(&[TextLine::new(50, 700, 12, "Cover")])
        .image_page()
        .build();

    let images = pdf::extract_images_info(&bytes)?;

    assert_eq!(images.len(), 1);
    assert_eq!(images[0].page_index, 1);
    assert_eq!(images[0].index, 0);
    assert_eq!(images[0].name, "Im0");
    assert_eq!((images[0].width, images[0].height), (2, 2));
    Ok(())
}

#[test]
fn test_extract_withMalformedInput_shouldFailWithFormatError() {
    let truncated = &common::single_block_pdf("Hello")[..40];

    assert!(matches!(pdf::extract(b"%PDF-1.5 garbage"), Err(PdfError::DocumentFormat(_))));
    assert!(matches!(pdf::get_info(truncated), Err(PdfError::DocumentFormat(_))));
    assert!(matches!(pdf::has_extractable_text(&[]), Err(PdfError::DocumentFormat(_))));
}
