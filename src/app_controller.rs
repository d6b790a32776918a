use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{AppError, PdfError, TranslationError};
use crate::file_utils::{FileManager, FileType};
use crate::language_utils::{self, DetectedLanguage};
use crate::pdf::fonts::{FontSet, find_system_font};
use crate::pdf::reflow::{ReflowOptions, reflow_with_options};
use crate::pdf::{self, RewriteOptions, TextBlock};
use crate::translation::{CancellationToken, Orchestrator, ProgressFn};

// @module: Application controller for PDF translation

/// Name of the issue log written next to the outputs
const ISSUES_LOG: &str = "pdftrans.issues.log";

/// Layout rewrite step of the pipeline, `pdf::rewrite` unless replaced
pub type RewriteFn = fn(&[u8], &[TextBlock], &[String], &RewriteOptions) -> Result<Vec<u8>, PdfError>;

/// Result of one document run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Bytes of the translated document
    pub bytes: Vec<u8>,
    /// Whether the layout rewrite failed and the reflow writer was used
    pub used_fallback: bool,
    pub page_count: usize,
    /// Number of extracted blocks
    pub block_count: usize,
    /// Blocks whose translation differs from the original text
    pub translated_count: usize,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Block translation driver, owns the provider cache
    orchestrator: Orchestrator,
    // @field: Layout rewrite step
    rewriter: RewriteFn,
}

impl Controller {
    /// Create a controller with a mock provider and default configuration
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.translation.provider = crate::app_config::TranslationProvider::Mock;
        Self::with_config(config)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let orchestrator = Orchestrator::from_config(&config);
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    /// Create a controller around a preconfigured orchestrator
    pub fn with_orchestrator(config: Config, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
            rewriter: pdf::rewrite,
        }
    }

    /// Replace the layout rewrite step
    pub fn with_rewriter(mut self, rewriter: RewriteFn) -> Self {
        self.rewriter = rewriter;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that stops the current and future runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.orchestrator.cancellation_token()
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Translate a document held in memory.
    ///
    /// Stages and reported progress: validation and text check, translation
    /// (0.3 to 0.8), layout rewrite (0.85), done (1.0). Documents without
    /// text stop before any provider is contacted.
    pub async fn translate_pdf(
        &self,
        bytes: &[u8],
        source_language: &str,
        target_language: &str,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<PipelineOutput, AppError> {
        let limit = self.config.max_file_size_bytes();
        if bytes.len() as u64 > limit {
            return Err(AppError::FileTooLarge {
                size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
                limit_mb: self.config.max_file_size_mb,
            });
        }

        report(progress, 0.0, "Reading document");
        let info = pdf::get_info(bytes)?;
        debug!(
            "Document: {} page(s), {} bytes, {:.0}x{:.0}pt",
            info.page_count, info.byte_size, info.page_width, info.page_height
        );

        if !pdf::has_extractable_text(bytes)? {
            return Err(PdfError::EmptyContent.into());
        }

        if !self.orchestrator.supports(source_language, target_language) {
            return Err(TranslationError::UnsupportedLanguagePair {
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
            }
            .into());
        }

        let font_path = self.font_for(target_language)?;

        report(progress, 0.1, "Extracting text");
        let blocks = pdf::extract(bytes)?;
        if blocks.is_empty() {
            return Err(PdfError::EmptyContent.into());
        }
        info!("Extracted {} text block(s) from {} page(s)", blocks.len(), info.page_count);

        report(progress, 0.3, "Translating");
        let texts: Vec<String> = blocks.iter().map(|b| b.text.clone()).collect();
        let scaled = |fraction: f32, message: &str| {
            if let Some(callback) = progress {
                callback(0.3 + 0.5 * fraction, message);
            }
        };
        let translated = self
            .orchestrator
            .translate_blocks(&texts, source_language, target_language, Some(&scaled))
            .await?;
        let translated_count = texts.iter().zip(&translated).filter(|(a, b)| a != b).count();

        let joined = translated.join("\n");

        report(progress, 0.85, "Rebuilding layout");
        let options = RewriteOptions {
            font_path: font_path.clone(),
            ..RewriteOptions::from(&self.config.rendering)
        };
        let (output, used_fallback) = match (self.rewriter)(bytes, &blocks, &translated, &options) {
            Ok(output) => (output, false),
            Err(PdfError::LayoutRewrite(reason)) => {
                warn!("Layout rewrite failed ({}); writing reflowed text instead", reason);
                let reflow_options = ReflowOptions {
                    font_path,
                    ..ReflowOptions::from(&self.config.rendering)
                };
                let reflowed = reflow_with_options(&joined, Some(bytes), &reflow_options)?;
                (reflowed, true)
            }
            Err(e) => return Err(e.into()),
        };

        report(progress, 1.0, "Done");
        Ok(PipelineOutput {
            bytes: output,
            used_fallback,
            page_count: info.page_count,
            block_count: blocks.len(),
            translated_count,
        })
    }

    /// Font file for text in `target_language`.
    ///
    /// A configured font must load. Without one, WinAnsi languages use
    /// Helvetica and other scripts need an installed font covering them.
    fn font_for(&self, target_language: &str) -> Result<Option<String>, AppError> {
        let rendering = &self.config.rendering;
        if let Some(path) = rendering.font_path.as_deref().filter(|p| !p.trim().is_empty()) {
            FontSet::from_path(Some(path)).map_err(|e| AppError::Config(e.to_string()))?;
            return Ok(Some(path.to_string()));
        }
        if language_utils::is_win_ansi_language(target_language) {
            return Ok(None);
        }

        let found = language_utils::script_sample(target_language)
            .filter(|_| rendering.system_fonts)
            .and_then(find_system_font);
        match found {
            Some(path) => {
                info!("Using system font {}", path.display());
                Ok(Some(path.to_string_lossy().to_string()))
            }
            None => {
                let name = language_utils::get_language_name(target_language)
                    .unwrap_or_else(|_| target_language.to_string());
                Err(AppError::Config(format!(
                    "Translating into {} needs a Unicode TrueType font; set rendering.font_path or pass --font",
                    name
                )))
            }
        }
    }

    /// Guess the language of a document from its text
    pub fn detect_document_language(&self, bytes: &[u8]) -> Result<DetectedLanguage, AppError> {
        let text = pdf::extract_plain_text(bytes)?;
        if text.trim().is_empty() {
            return Err(PdfError::EmptyContent.into());
        }
        Ok(self.orchestrator.detect_language(&text))
    }

    /// Run the main workflow with an input document (or folder) and output directory
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        if FileManager::detect_file_type(&input_file)? == FileType::Directory {
            return self.run_folder(input_file, output_dir, force_overwrite).await;
        }
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
            .map(|_| ())
    }

    /// Translate one file; returns `false` when it was skipped
    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<bool> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input_file));
        }
        if FileManager::detect_file_type(input_file)? != FileType::Pdf {
            return Err(anyhow::anyhow!("Not a PDF document: {:?}", input_file));
        }

        FileManager::ensure_dir(output_dir)?;
        let output_path = FileManager::generate_output_path(input_file, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(false);
        }

        let bytes = FileManager::read_bytes(input_file)?;

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        info!(
            "pdftrans: {} {} → {}",
            self.config.translation.provider.display_name(),
            self.config.source_language,
            self.config.target_language
        );

        let pb = progress_bar.clone();
        let on_progress = move |fraction: f32, message: &str| {
            pb.set_position((fraction.clamp(0.0, 1.0) * 100.0) as u64);
            pb.set_message(message.to_string());
        };

        let result = self
            .translate_pdf(
                &bytes,
                &self.config.source_language,
                &self.config.target_language,
                Some(&on_progress),
            )
            .await;
        progress_bar.finish_and_clear();

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                error!("{}", e.user_message());
                self.log_issue(output_dir, &format!("{}: {}", input_file.display(), e));
                return Err(anyhow::Error::new(e).context(format!("Failed to translate {:?}", input_file)));
            }
        };

        if output.used_fallback {
            self.log_issue(
                output_dir,
                &format!("{}: layout rewrite failed, reflowed text written", input_file.display()),
            );
        }

        FileManager::write_bytes(&output_path, &output.bytes)?;
        info!(
            "Success: {} ({} of {} block(s) translated in {})",
            output_path.display(),
            output.translated_count,
            output.block_count,
            Self::format_duration(start_time.elapsed())
        );

        Ok(true)
    }

    /// Run the workflow in folder mode, processing all PDF files in a directory.
    /// Files that already have a translation are skipped.
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow::anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(&input_dir, "pdf")?;
        if files.is_empty() {
            return Err(anyhow::anyhow!("No PDF files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        for file in &files {
            if self.orchestrator.cancellation_token().is_cancelled() {
                warn!("Folder processing cancelled");
                break;
            }

            let file_name = file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            // Mirror the input tree below the output directory
            let target_dir = file
                .parent()
                .and_then(|parent| parent.strip_prefix(&input_dir).ok())
                .map(|relative| output_dir.join(relative))
                .unwrap_or_else(|| output_dir.clone());

            match self.run_with_progress(file, &target_dir, &multi_progress, force_overwrite).await {
                Ok(true) => success_count += 1,
                Ok(false) => skip_count += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    error_count += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            success_count, skip_count, error_count
        );
        info!("{}", summary);
        self.log_issue(
            &output_dir,
            &format!("{} - Duration: {}", summary, Self::format_duration(start_time.elapsed())),
        );

        Ok(())
    }

    fn log_issue(&self, output_dir: &Path, message: &str) {
        let path = output_dir.join(ISSUES_LOG);
        if let Err(e) = FileManager::append_to_log_file(&path, message) {
            warn!("Failed to write issue log: {}", e);
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Invoke a progress callback, ignoring a panic inside it
fn report(progress: Option<ProgressFn<'_>>, fraction: f32, message: &str) {
    if let Some(callback) = progress
        && catch_unwind(AssertUnwindSafe(|| callback(fraction, message))).is_err()
    {
        warn!("Progress callback panicked; continuing");
    }
}
