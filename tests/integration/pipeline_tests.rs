/*!
 * End-to-end tests for in-memory document translation
 */

use anyhow::Result;
use pdftrans::errors::{AppError, PdfError, TranslationError};
use pdftrans::pdf::{self, BBox, RewriteOptions, TextBlock, TextStyle};
use pdftrans::providers::mock::MockProvider;
use pdftrans::{Controller, DetectedLanguage};
use std::sync::Arc;

use crate::common;

fn controller_with(mock: &MockProvider) -> Controller {
    Controller::with_orchestrator(common::test_config(), common::mock_orchestrator(mock.clone()))
}

fn broken_rewriter(
    _: &[u8],
    _: &[TextBlock],
    _: &[String],
    _: &RewriteOptions,
) -> Result<Vec<u8>, PdfError> {
    Err(PdfError::LayoutRewrite("forced failure".to_string()))
}

fn intersects(a: &BBox, b: &BBox) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

#[tokio::test]
async fn test_translatePdf_withMockProvider_shouldRenderTranslationInPlace() -> Result<()> {
    let mock = MockProvider::working().with_custom_response(common::shouting);
    let controller = controller_with(&mock);
    let bytes = common::single_block_pdf("Hello world");

    let output = controller.translate_pdf(&bytes, "en", "fr", None).await?;

    assert!(!output.used_fallback);
    assert_eq!(output.page_count, 1);
    assert_eq!(output.block_count, 1);
    assert_eq!(output.translated_count, 1);
    assert!(common::flat_text(&output.bytes)?.contains("HELLO WORLD"));
    Ok(())
}

#[test]
fn test_rewrite_withKnownBlockBox_shouldPlaceTranslationInsideRegion() -> Result<()> {
    let original = common::single_block_pdf("Hello world");
    let region = BBox::new(50.0, 50.0, 200.0, 70.0);
    let blocks = vec![TextBlock {
        page_index: 0,
        bbox: region,
        text: "Hello world".to_string(),
        order_index: 0,
        style: TextStyle::default(),
    }];

    let output = pdf::rewrite(&original, &blocks, &["HELLO WORLD".to_string()], &RewriteOptions::default())?;

    let before = pdf::get_info(&original)?;
    let after = pdf::get_info(&output)?;
    assert_eq!(after.page_count, before.page_count);
    assert_eq!((after.page_width, after.page_height), (before.page_width, before.page_height));

    let words = common::content_words(&output)?.remove(0);
    for expected in ["HELLO", "WORLD"] {
        assert!(
            words.iter().any(|(text, bbox)| text == expected && intersects(bbox, &region)),
            "{} not found near {:?}: {:?}",
            expected,
            region,
            words
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_translatePdf_withImageOnlyDocument_shouldFailBeforeAnyProviderCall() {
    let mock = MockProvider::working();
    let controller = controller_with(&mock);

    let result = controller.translate_pdf(&common::image_only_pdf(), "en", "fr", None).await;

    assert!(matches!(result, Err(AppError::Pdf(PdfError::EmptyContent))));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_translatePdf_whenLayoutRewriteFails_shouldFallBackToReflow() -> Result<()> {
    let mock = MockProvider::working().with_custom_response(common::shouting);
    let controller = controller_with(&mock).with_rewriter(broken_rewriter);
    let bytes = common::multi_page_pdf();

    let output = controller.translate_pdf(&bytes, "en", "fr", None).await?;

    assert!(output.used_fallback);
    let text = common::flat_text(&output.bytes)?;
    assert!(text.contains("INTRODUCTION"));
    assert!(text.contains("RESULTS"));
    let info = pdf::get_info(&output.bytes)?;
    assert_eq!((info.page_width, info.page_height), (612.0, 792.0));
    Ok(())
}

#[tokio::test]
async fn test_translatePdf_withMultiPageDocument_shouldKeepEveryPage() -> Result<()> {
    let mock = MockProvider::working().with_custom_response(common::shouting);
    let controller = controller_with(&mock);

    let output = controller.translate_pdf(&common::multi_page_pdf(), "en", "fr", None).await?;

    assert_eq!(output.page_count, 3);
    assert_eq!(output.block_count, 6);
    assert_eq!(pdf::get_info(&output.bytes)?.page_count, 3);
    let text = common::flat_text(&output.bytes)?;
    let first = text.find("INTRODUCTION").expect("first heading rendered");
    let last = text.find("RESULTS").expect("last heading rendered");
    assert!(first < last);
    Ok(())
}

#[tokio::test]
async fn test_translatePdf_withUnsupportedPair_shouldNotContactProvider() {
    let mock = MockProvider::working();
    let controller = controller_with(&mock);

    let result = controller
        .translate_pdf(&common::single_block_pdf("Bonjour"), "fr", "de", None)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Translation(TranslationError::UnsupportedLanguagePair { .. }))
    ));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_translatePdf_shouldReportProgressFromZeroToOne() -> Result<()> {
    let controller = controller_with(&MockProvider::working());
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback = move |fraction: f32, _: &str| sink.lock().push(fraction);

    controller
        .translate_pdf(&common::multi_page_pdf(), "en", "fr", Some(&callback))
        .await?;

    let seen = seen.lock().clone();
    assert_eq!(seen.first().copied(), Some(0.0));
    assert_eq!(seen.last().copied(), Some(1.0));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
    Ok(())
}

#[tokio::test]
async fn test_translatePdf_withDevanagariTargetAndNoFont_shouldFailBeforeTranslating() {
    let mut config = common::test_config();
    config.rendering.font_path = None;
    config.rendering.system_fonts = false;
    let mock = MockProvider::working().with_custom_response(common::hindi_dictionary);
    let controller = Controller::with_orchestrator(config, common::mock_orchestrator(mock.clone()));

    let result = controller
        .translate_pdf(&common::single_block_pdf("Open the file"), "en", "hi", None)
        .await;

    match result {
        Err(AppError::Config(message)) => assert!(message.contains("Hindi"), "{}", message),
        other => panic!("expected a configuration error, got {:?}", other.map(|o| o.block_count)),
    }
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_translatePdf_withUnreadableFontPath_shouldFailBeforeTranslating() {
    let mut config = common::test_config();
    config.rendering.font_path = Some("/nonexistent/NotoSansDevanagari.ttf".to_string());
    let mock = MockProvider::working().with_custom_response(common::shouting);
    let controller = Controller::with_orchestrator(config, common::mock_orchestrator(mock.clone()));

    let result = controller
        .translate_pdf(&common::single_block_pdf("Hello world"), "en", "fr", None)
        .await;

    assert!(matches!(result, Err(AppError::Config(_))));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_translatePdf_withOversizedInput_shouldRejectIt() {
    let mut config = common::test_config();
    config.max_file_size_mb = 0;
    let mock = MockProvider::working();
    let controller = Controller::with_orchestrator(config, common::mock_orchestrator(mock.clone()));

    let result = controller
        .translate_pdf(&common::single_block_pdf("Hello"), "en", "fr", None)
        .await;

    assert!(matches!(result, Err(AppError::FileTooLarge { limit_mb: 0, .. })));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_translatePdf_withMalformedInput_shouldReportFormatError() {
    let controller = controller_with(&MockProvider::working());

    let result = controller.translate_pdf(b"%PDF-1.4 not really", "en", "fr", None).await;

    assert!(matches!(result, Err(AppError::Pdf(PdfError::DocumentFormat(_)))));
}

#[tokio::test]
async fn test_translatePdf_whenCancelled_shouldStopWithCancelledError() {
    let mock = MockProvider::working();
    let controller = controller_with(&mock);
    controller.cancellation_token().cancel();

    let result = controller
        .translate_pdf(&common::single_block_pdf("Hello world"), "en", "fr", None)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Translation(TranslationError::Cancelled { completed: 0, total: 1 }))
    ));
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_detectDocumentLanguage_shouldReadDocumentText() {
    let controller = controller_with(&MockProvider::working());

    assert_eq!(
        controller.detect_document_language(&common::multi_page_pdf()).ok(),
        Some(DetectedLanguage::English)
    );
    assert!(matches!(
        controller.detect_document_language(&common::image_only_pdf()),
        Err(AppError::Pdf(PdfError::EmptyContent))
    ));
}
