/*!
 * Tests for file and folder runs through the controller
 */

use anyhow::Result;
use pdftrans::Controller;
use pdftrans::app_config::TranslationProvider;
use pdftrans::providers::mock::MockProvider;
use std::fs;

use crate::common;

fn shouting_controller() -> Controller {
    let mock = MockProvider::working().with_custom_response(common::shouting);
    Controller::with_orchestrator(common::test_config(), common::mock_orchestrator(mock))
}

/// Test a full run with the configuration-built mock provider
#[test]
fn test_run_withMockProviderConfig_shouldUseConfiguredMock() -> Result<()> {
    let mut config = common::test_config();
    config.translation.provider = TranslationProvider::Mock;
    let controller = Controller::with_config(config)?;
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "memo.pdf", &common::single_block_pdf("Hello world"))?;

    let result = tokio_test::block_on(async {
        controller.run(input, dir.path().to_path_buf(), false).await
    });

    assert!(result.is_ok(), "Run should complete without errors");
    let output = fs::read(dir.path().join("memo_translated.pdf"))?;
    assert!(common::flat_text(&output)?.contains("[TRANSLATED to fr] Hello world"));
    Ok(())
}

#[tokio::test]
async fn test_run_withSingleFile_shouldWriteTranslatedCopy() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;
    let input = common::create_test_file(input_dir.path(), "report.pdf", &common::single_block_pdf("Hello world"))?;

    shouting_controller()
        .run(input, output_dir.path().to_path_buf(), false)
        .await?;

    let output = output_dir.path().join("report_translated.pdf");
    assert!(output.exists());
    assert!(common::flat_text(&fs::read(output)?)?.contains("HELLO WORLD"));
    Ok(())
}

#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "notes.pdf", &common::single_block_pdf("Hello"))?;
    let existing = common::create_test_file(dir.path(), "notes_translated.pdf", b"previous run")?;
    let controller = shouting_controller();

    controller.run(input.clone(), dir.path().to_path_buf(), false).await?;
    assert_eq!(fs::read(&existing)?, b"previous run");

    controller.run(input, dir.path().to_path_buf(), true).await?;
    assert!(fs::read(&existing)?.starts_with(b"%PDF-"));
    Ok(())
}

#[tokio::test]
async fn test_run_withDirectory_shouldMirrorTreeAndSkipOutputs() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;
    let nested = input_dir.path().join("chapters");
    fs::create_dir_all(&nested)?;
    common::create_test_file(input_dir.path(), "cover.pdf", &common::single_block_pdf("Cover"))?;
    common::create_test_file(&nested, "one.pdf", &common::multi_page_pdf())?;
    common::create_test_file(input_dir.path(), "old_translated.pdf", &common::single_block_pdf("Old"))?;

    shouting_controller()
        .run(input_dir.path().to_path_buf(), output_dir.path().to_path_buf(), false)
        .await?;

    assert!(output_dir.path().join("cover_translated.pdf").exists());
    assert!(output_dir.path().join("chapters").join("one_translated.pdf").exists());
    assert!(!output_dir.path().join("old_translated_translated.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withUntranslatableFile_shouldContinueAndLogIssue() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;
    common::create_test_file(input_dir.path(), "scan.pdf", &common::image_only_pdf())?;
    common::create_test_file(input_dir.path(), "text.pdf", &common::single_block_pdf("Hello"))?;

    shouting_controller()
        .run_folder(input_dir.path().to_path_buf(), output_dir.path().to_path_buf(), false)
        .await?;

    assert!(!output_dir.path().join("scan_translated.pdf").exists());
    assert!(output_dir.path().join("text_translated.pdf").exists());
    let issues = fs::read_to_string(output_dir.path().join("pdftrans.issues.log"))?;
    assert!(issues.contains("scan.pdf"));
    assert!(issues.contains("1 processed"));
    Ok(())
}

#[test]
fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let controller = shouting_controller();

    let result = tokio_test::block_on(async {
        controller
            .run(dir.path().join("absent.pdf"), dir.path().to_path_buf(), false)
            .await
    });

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_run_withNonPdfFile_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "notes.txt", b"plain text")?;

    let result = shouting_controller().run(input, dir.path().to_path_buf(), false).await;

    assert!(result.is_err());
    assert!(!dir.path().join("notes_translated.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withEmptyDirectory_shouldFail() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;

    let result = shouting_controller()
        .run_folder(input_dir.path().to_path_buf(), output_dir.path().to_path_buf(), false)
        .await;

    assert!(result.is_err());
    Ok(())
}
