mod appender;
mod config;
mod discover;
mod error;
mod hook;
mod merge;
mod progress;
mod reader;
mod table;
mod value;
mod writer;

use clap::{Parser, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    European,
}

impl OutputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
            OutputFormat::European => b';',
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ledger-append")]
#[command(version, about = "Append a loading export to the Seguimento tracking ledger")]
pub struct Args {
    /// Folder containing the loading export and the ledger
    #[arg(default_value = ".")]
    pub folder: PathBuf,

    /// Loading export to read (default: first file in FOLDER matching "loading")
    #[arg(short, long)]
    pub loading: Option<PathBuf>,

    /// Ledger to append to (default: first file in FOLDER matching "seguimento")
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Ledger sheet receiving the rows
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// JSON file overriding the column mapping, date columns or hook
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Do not copy the ledger to <name>_backup before writing
    #[arg(long)]
    pub no_backup: bool,

    /// Print the rows that would be appended instead of saving
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Program run against the saved ledger (e.g. a macro runner)
    #[arg(long)]
    pub hook_command: Option<String>,

    /// Extra argument for the hook program (repeatable)
    #[arg(long = "hook-arg", allow_hyphen_values = true)]
    pub hook_args: Vec<String>,

    /// Macro name passed to the hook program
    #[arg(long = "macro")]
    pub macro_name: Option<String>,

    /// Print detailed progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> error::Result<()> {
    let mut config = match &args.config {
        Some(path) => config::AppendConfig::load(path)?,
        None => config::AppendConfig::default(),
    };
    if let Some(sheet) = args.sheet {
        config.sheet_name = sheet;
    }
    if let Some(command) = args.hook_command {
        config.hook.command = Some(command);
    }
    if !args.hook_args.is_empty() {
        config.hook.args = args.hook_args;
    }
    if args.macro_name.is_some() {
        config.hook.macro_name = args.macro_name;
    }

    let mut request = merge::MergeRequest::new(args.folder);
    request.loading = args.loading;
    request.target = args.target;
    request.backup = !args.no_backup;
    request.preview = args.dry_run.then_some(writer::PreviewConfig {
        format: args.format,
    });

    let hook: Box<dyn hook::PostProcessHook> = match hook::CommandHook::from_config(&config.hook) {
        Some(command) => Box::new(command),
        None => Box::new(hook::NoHook),
    };

    let stdout = io::stdout();
    let report = merge::run(
        &request,
        &config,
        &mut progress::LogProgress,
        hook.as_ref(),
        stdout.lock(),
    )?;

    if report.saved {
        eprintln!(
            "{} rows appended to {} (rows {}-{})",
            report.append.rows_written,
            report.inputs.target.display(),
            report.append.start_row,
            report.append.new_last_row
        );
        if let Some(backup) = &report.backup {
            eprintln!("backup saved as: {}", backup.display());
        }
        if report.hook != hook::HookOutcome::Skipped {
            eprintln!("{}", report.hook);
        }
    }
    if let Some(range) = &report.table_range {
        tracing::debug!(range = %range, "table extended");
    }
    if report.conditional_formats_extended > 0 {
        tracing::debug!(
            rules = report.conditional_formats_extended,
            "conditional formatting extended"
        );
    }
    tracing::debug!(
        template_row = report.append.template_row,
        columns = report.append.columns_mapped,
        formulas = report.append.formulas_replayed,
        "append summary"
    );

    Ok(())
}
