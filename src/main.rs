// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use pdftrans::app_config::{self, Config, TranslationProvider};
use pdftrans::app_controller::Controller;
use pdftrans::file_utils::FileManager;
use pdftrans::pdf;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    Hosted,
    Ollama,
    Mock,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::Hosted => TranslationProvider::Hosted,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Mock => TranslationProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a PDF document or every PDF in a folder (default command)
    Translate(TranslateArgs),

    /// Print page count, size and metadata of a PDF document
    Info {
        /// PDF document to inspect
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
    },

    /// Guess whether a PDF document is written in Hindi or English
    Detect {
        /// PDF document to inspect
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,
    },

    /// Generate shell completions for pdftrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input PDF document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory for translated documents (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code ('en' or 'hi')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code ('en' or 'hi')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Direction label from the configuration, e.g. "English to Hindi"
    #[arg(short, long, conflicts_with_all = ["source_language", "target_language"])]
    direction: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write the translation without the toggleable "Translated" layer
    #[arg(long)]
    no_layer: bool,

    /// TrueType font used for the translated text
    #[arg(long, env = "PDFTRANS_FONT")]
    font: Option<String>,
}

/// pdftrans - layout-aware PDF translation
///
/// Extracts positioned text blocks from a PDF, translates them between
/// English and Hindi and writes them back at their original positions.
#[derive(Parser, Debug)]
#[command(name = "pdftrans")]
#[command(version)]
#[command(about = "Layout-aware PDF translation between English and Hindi")]
#[command(long_about = "pdftrans extracts text blocks from a PDF, translates them and writes them back in place.

EXAMPLES:
    pdftrans report.pdf                          # Translate using default config
    pdftrans -f report.pdf                       # Force overwrite existing output
    pdftrans -s hi -t en report.pdf              # Translate from Hindi to English
    pdftrans -d \"English to Hindi\" report.pdf    # Pick a configured direction
    pdftrans -p ollama -m llama3.2:3b report.pdf # Use a local model
    pdftrans --font NotoSansDevanagari.ttf a.pdf # Embed a Unicode font
    pdftrans --log-level debug /documents/       # Process an entire directory
    pdftrans info report.pdf                     # Show document information
    pdftrans completions bash > pdftrans.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    google - Public Google Translate endpoint (default)
    hosted - OpenAI-compatible inference endpoint (reads HF_TOKEN)
    ollama - Local Ollama server
    mock   - Offline provider that tags text instead of translating it")]
#[command(args_conflicts_with_subcommands = true)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input PDF document or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Directory for translated documents (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code ('en' or 'hi')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code ('en' or 'hi')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Direction label from the configuration, e.g. "English to Hindi"
    #[arg(short, long, conflicts_with_all = ["source_language", "target_language"])]
    direction: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Write the translation without the toggleable "Translated" layer
    #[arg(long)]
    no_layer: bool,

    /// TrueType font used for the translated text
    #[arg(long, env = "PDFTRANS_FONT")]
    font: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info by default; raised or lowered once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "pdftrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Info { input_path }) => run_info(&input_path),
        Some(Commands::Detect { input_path }) => run_detect(&input_path),
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - top-level args act as the translate command
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let translate_args = TranslateArgs {
                input_path,
                output_dir: cli.output_dir,
                force_overwrite: cli.force_overwrite,
                provider: cli.provider,
                model: cli.model,
                source_language: cli.source_language,
                target_language: cli.target_language,
                direction: cli.direction,
                config_path: cli.config_path,
                log_level: cli.log_level,
                no_layer: cli.no_layer,
                font: cli.font,
            };
            run_translate(translate_args).await
        }
    }
}

/// Load the configuration file, writing the default one when missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        Ok(config)
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = load_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(label) = &options.direction {
        let direction = config
            .find_direction(label)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown direction: {}", label))?;
        config.source_language = direction.source;
        config.target_language = direction.target;
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if options.no_layer {
        config.rendering.ocg_layer = false;
    }

    if let Some(font) = &options.font {
        config.rendering.font_path = Some(font.clone());
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;

    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None if options.input_path.is_dir() => options.input_path.clone(),
        None => options
            .input_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf(),
    };

    if !options.input_path.exists() {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    // Ctrl+C stops the run at the next block boundary
    let cancel = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, stopping after the current block...");
            cancel.cancel();
        }
    });

    controller
        .run(options.input_path.clone(), output_dir, options.force_overwrite)
        .await
}

fn run_info(input_path: &Path) -> Result<()> {
    let bytes = FileManager::read_bytes(input_path)?;
    let info = pdf::get_info(&bytes)?;
    let images = pdf::extract_images_info(&bytes)?;
    let blocks = pdf::extract(&bytes)?;

    info!("File: {}", input_path.display());
    info!("Pages: {}", info.page_count);
    info!("Size: {} bytes", info.byte_size);
    info!("Page size: {:.1} x {:.1} pt", info.page_width, info.page_height);
    info!("Encrypted: {}", if info.encrypted { "yes" } else { "no" });
    info!("Text blocks: {}", blocks.len());
    info!("Images: {}", images.len());
    for (key, value) in &info.metadata {
        info!("{}: {}", key, value);
    }

    Ok(())
}

fn run_detect(input_path: &Path) -> Result<()> {
    let bytes = FileManager::read_bytes(input_path)?;
    let text = pdf::extract_plain_text(&bytes)?;
    let detected = pdftrans::language_utils::detect_language(&text);

    match detected.code() {
        Some(code) => info!("Detected language: {:?} ({})", detected, code),
        None => info!("Detected language: undetermined"),
    }

    Ok(())
}
