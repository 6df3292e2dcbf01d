//! Grade command - grade captured sheet photos.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use bubblegrade_adapters::{
    model_path, set_models_dir, FsSheetSource, JsonKeyStore, JsonStudentDirectory, OutboxNotifier,
};
use bubblegrade_core::inference::{get_device, GlyphCnn, LazyModel};
use bubblegrade_core::{GradeError, Grader, GraderConfig, SheetLayout};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{GradeRecord, JsonOutput};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Shared arguments for sheet grading.
#[derive(Args, Clone)]
pub struct GradeArgs {
    /// Sheet photo files or directories to grade
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Directory of answer key JSON files
    #[arg(long, value_name = "DIR")]
    pub keys: Option<PathBuf>,

    /// Student roster JSON file for score notifications
    #[arg(long, value_name = "FILE")]
    pub students: Option<PathBuf>,

    /// Outbox file score notifications are appended to
    #[arg(long, value_name = "FILE")]
    pub outbox: Option<PathBuf>,

    /// Disable student identifier reading
    #[arg(long)]
    pub no_id: bool,

    /// Ink threshold for identifier segmentation (0-255)
    #[arg(long)]
    pub ink_level: Option<u8>,

    /// Minimum ink pixels for a bubble to count as marked
    #[arg(long)]
    pub fill_floor: Option<u32>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl GradeArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (core config `Default` impls)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        // Recursive: config applies only if CLI --recursive not passed
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        // Identifier reading: CLI --no-id takes precedence, then config
        if !args.no_id {
            if let Some(enabled) = config.identifier.enabled {
                args.no_id = !enabled;
            }
        }

        // Thresholds: CLI > config (core defaults as final fallback)
        args.ink_level = args.ink_level.or(config.identifier.ink_level);
        args.fill_floor = args.fill_floor.or(config.bubbles.fill_floor);

        // Stores: CLI > config
        if args.keys.is_none() {
            args.keys.clone_from(&config.keys.dir);
        }
        if args.students.is_none() {
            args.students.clone_from(&config.students.file);
        }
        if args.outbox.is_none() {
            args.outbox.clone_from(&config.notify.outbox);
        }

        // Output format: CLI > config
        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }

        // Models directory: CLI > config
        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.models.dir);
        }

        // Store config for grader_config to access advanced settings
        args.config = Some(config.clone());

        args
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }
}

/// Result of running the grade command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct GradeResult {
    /// Number of sheets graded.
    pub graded: usize,
    /// Number of sheets that failed to grade.
    pub failed: usize,
    /// Number of photos that could not be loaded.
    pub skipped: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the grade command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &GradeArgs) -> Result<GradeResult> {
    info!("Grading sheets from {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }
    let Some(keys_dir) = &args.keys else {
        anyhow::bail!("No answer key directory specified. Pass --keys or set keys.dir in config.");
    };

    // Apply models directory override if specified
    if let Some(ref models_dir) = args.models_dir {
        debug!("Using custom models directory: {}", models_dir.display());
        set_models_dir(Some(models_dir.clone()));
    }

    // Fail fast on an unreadable or malformed key directory.
    let known = bubblegrade_adapters::load_all_keys(keys_dir)?;
    debug!("Loaded {} answer keys from {}", known.len(), keys_dir.display());

    let store = JsonKeyStore::new(keys_dir);
    let students = args
        .students
        .as_deref()
        .map(JsonStudentDirectory::load)
        .transpose()?;
    let notifier = args.outbox.as_ref().map(OutboxNotifier::new);

    let glyph = build_glyph_model(args);
    let char_model = glyph.as_ref().map(LazyModel::get).transpose()?;

    let mut grader = Grader::new(SheetLayout::v1(), grader_config(args), &store);
    if let Some(model) = char_model {
        grader = grader.with_char_model(model);
    }
    if let Some(directory) = &students {
        grader = grader.with_student_directory(directory);
    }
    if let Some(outbox) = &notifier {
        grader = grader.with_notifier(outbox);
    }

    let source = FsSheetSource::new(args.paths.clone(), args.recursive);
    let output = JsonOutput::stdout();
    grade_sheets(&source, &grader, &output, args)
}

/// Lazy glyph model handle, when identifier reading is enabled and the
/// weights are installed.
fn build_glyph_model(args: &GradeArgs) -> Option<LazyModel<GlyphCnn>> {
    if args.no_id {
        debug!("Identifier reading disabled by flag");
        return None;
    }
    let path = model_path("glyph-cnn")?;
    if !path.exists() {
        info!(
            "Identifier reading disabled: {} not found. Run `bubblegrade models fetch`.",
            path.display()
        );
        return None;
    }
    Some(LazyModel::new(path, get_device(), GlyphCnn::new))
}

/// Build the pipeline config from merged args (CLI + config file).
fn grader_config(args: &GradeArgs) -> GraderConfig {
    let cfg = args.config.as_ref();
    let mut config = GraderConfig::default();

    if let Some(floor) = args.fill_floor {
        config.bubbles.fill_floor = floor;
    }
    if let Some(min) = cfg.and_then(|c| c.bubbles.min_size) {
        config.bubbles.min_size = min;
    }
    if let Some(max) = cfg.and_then(|c| c.bubbles.max_size) {
        config.bubbles.max_size = max;
    }
    if let Some(level) = args.ink_level {
        config.id_read.ink_level = level;
    }
    if let Some(attempts) = cfg.and_then(|c| c.quiz.max_attempts) {
        config.quiz_id.max_attempts = attempts;
    }

    config
}

/// Grade every sheet the source yields.
fn grade_sheets(
    source: &FsSheetSource,
    grader: &Grader<'_>,
    output: &JsonOutput,
    args: &GradeArgs,
) -> Result<GradeResult> {
    let mut graded = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;
    let mut records: Vec<GradeRecord> = Vec::new();
    let stream = matches!(args.format(), OutputFormat::Jsonl);

    for (index, sheet_result) in source.sheets().enumerate() {
        let record = match sheet_result {
            Ok(sheet) => {
                let source_tag = sheet.source.clone();
                match grader.grade(&sheet) {
                    Ok(outcome) => {
                        graded += 1;
                        GradeRecord::graded(source_tag, outcome)
                    }
                    Err(e) => {
                        warn!(source = source_tag, "grading failed: {e}");
                        failed += 1;
                        GradeRecord::failed(source_tag, e.code(), e.to_string())
                    }
                }
            }
            Err(e) => {
                // Error message carries the path via anyhow context.
                warn!("skipping photo {index}: {e:#}");
                skipped += 1;
                let err = GradeError::InvalidImage {
                    reason: format!("{e:#}"),
                };
                GradeRecord::failed(format!("photo {index}"), err.code(), err.to_string())
            }
        };

        if stream {
            output.write(&record)?;
        } else {
            records.push(record);
        }
    }

    if !stream {
        output.write_array(&records, args.pretty)?;
    }

    info!(graded, failed, skipped, "grading run complete");
    let exit_code = if failed + skipped == 0 {
        ExitCode::Success
    } else {
        ExitCode::SheetsFailed
    };
    Ok(GradeResult {
        graded,
        failed,
        skipped,
        exit_code,
    })
}
