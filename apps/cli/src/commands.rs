//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use color_eyre::{Report, Section, SectionExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use lessonforge_core::{AssignmentGenerator, GenerationProgress, PipelineConfig, compose_prompt_with};
use lessonforge_provider::{GeminiClient, GeminiOptions};
use lessonforge_shared::{
    AppConfig, GeneratedAssignment, LessonForgeError, init_config, load_config, resolve_api_key,
};
use lessonforge_template::{segment_template, template_starter_code};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// LessonForge: turn a topic into an interactive coding assignment.
#[derive(Parser)]
#[command(
    name = "lessonforge",
    version,
    about = "Generate interactive, module-based coding assignments from a short topic description.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate an assignment for a topic.
    Generate {
        /// Short description of what the assignment should teach.
        topic: String,

        /// Classroom context included in the prompt.
        #[arg(short, long)]
        context: Option<String>,

        /// Write the assignment JSON here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Override the configured model.
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the prompt that would be sent for a topic.
    Prompt {
        /// Short description of what the assignment should teach.
        topic: String,

        /// Classroom context included in the prompt.
        #[arg(short, long)]
        context: Option<String>,
    },

    /// Split a code template file into fixed and editable segments.
    Segment {
        /// Template file to read.
        file: PathBuf,

        /// Print segments as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a template's starter code with markers removed.
    Strip {
        /// Template file to read.
        file: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "lessonforge=info",
        1 => "lessonforge=debug",
        _ => "lessonforge=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so generated JSON on stdout stays clean.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            topic,
            context,
            out,
            model,
        } => cmd_generate(&topic, context.as_deref(), out.as_deref(), model).await,
        Command::Prompt { topic, context } => cmd_prompt(&topic, context.as_deref()),
        Command::Segment { file, json } => cmd_segment(&file, json),
        Command::Strip { file } => cmd_strip(&file),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    topic: &str,
    context: Option<&str>,
    out: Option<&Path>,
    model: Option<String>,
) -> Result<()> {
    let mut config = load_config()?;
    if let Some(model) = model {
        config.provider.model = model;
    }

    let api_key = resolve_api_key(&config)?;
    let client = GeminiClient::new(GeminiOptions::from_config(&config, api_key)?)?;
    let generator = AssignmentGenerator::new(client, PipelineConfig::from(&config));

    info!(topic, model = %generator.model(), "generating assignment");

    let progress = CliProgress::new();
    let result = generator
        .generate_with(topic, context, &progress)
        .await
        .map_err(|e| {
            progress.abandon();
            generation_report(e)
        })?;

    let json = serde_json::to_string_pretty(&result)?;
    match out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            print_summary(&result, path);
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn print_summary(result: &GeneratedAssignment, path: &Path) {
    let assignment = result.assignment();

    println!();
    println!("  Assignment generated!");
    println!("  ID:       {}", result.meta.id);
    println!("  Title:    {}", assignment.title);
    println!("  Language: {}", assignment.target_language);
    if !assignment.dependencies.is_empty() {
        println!("  Deps:     {}", assignment.dependencies.join(", "));
    }
    for module in &assignment.modules {
        println!("    - {}", module.display_title());
    }
    println!(
        "  Tokens:   {} in / {} out",
        result.meta.tokens_in, result.meta.tokens_out
    );
    println!("  Time:     {:.1}s", result.meta.latency_ms as f64 / 1000.0);
    println!("  Path:     {}", path.display());
    println!();
}

/// Turn a pipeline error into a report that names the failing stage and
/// shows the raw diagnostic text.
fn generation_report(err: LessonForgeError) -> Report {
    let stage = err.stage();
    let raw = err.raw_response().map(str::to_string);

    let mut report = Report::new(err);
    if let Some(stage) = stage {
        report = report.wrap_err(format!("generation failed at the {stage} stage"));
    }
    match raw {
        Some(raw) => report.section(raw.header("Raw response:")),
        None => report,
    }
}

fn cmd_prompt(topic: &str, context: Option<&str>) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(eyre!("topic must not be empty"));
    }
    let config = load_config()?;
    let prompt = compose_prompt_with(topic, context, &PipelineConfig::from(&config).prompt);
    println!("{prompt}");
    Ok(())
}

fn cmd_segment(file: &Path, json: bool) -> Result<()> {
    let raw = read_template(file)?;
    let segments = segment_template(&raw);

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
        return Ok(());
    }

    for (i, segment) in segments.iter().enumerate() {
        let kind = if segment.editable { "editable" } else { "fixed" };
        println!("[{i}] {kind}: {:?}", segment.text);
    }
    Ok(())
}

fn cmd_strip(file: &Path) -> Result<()> {
    let raw = read_template(file)?;
    print!("{}", template_starter_code(&raw));
    Ok(())
}

fn read_template(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).map_err(|e| LessonForgeError::io(file, e).into())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl GenerationProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &GeneratedAssignment) {
        self.spinner.finish_and_clear();
    }
}
