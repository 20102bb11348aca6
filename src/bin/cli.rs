//! Binary entry point for the leakpath CLI.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use leakpath::{
    load_candidates,
    report::{JsonLinesSink, RecordSink},
    Address, Capture, FinderOptions, LeakCandidate, ShutdownLeakFinder,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::CliConfig;
use ui::{TextSink, Theme, Ui};

/// Exit status when at least one leak record was emitted.
const EXIT_LEAKS_REPORTED: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "leakpath",
    version,
    about = "Explain shutdown leaks by finding retention paths to graph roots",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    report: ReportArgs,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for records and summaries"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = ThemeArg::Auto,
        help = "Color theme for text output"
    )]
    theme: ThemeArg,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "LEAKPATH_CONFIG",
        help = "Path to a TOML config file"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long, global = true, help = "Subtest name attached to records")]
    subtest: Option<String>,

    #[arg(long, global = true, help = "Reject unrecognized trace log lines")]
    strict: bool,

    #[arg(long, global = true, help = "Print node names exactly as captured")]
    no_clean_names: bool,

    #[arg(
        long,
        global = true,
        value_name = "LINES",
        help = "Trace log lines consumed per pull"
    )]
    batch_lines: Option<usize>,
}

#[derive(Args, Debug)]
struct LogArg {
    #[arg(long, value_name = "FILE", help = "Cycle-collector edge log")]
    log: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Report a retention path for every leak candidate")]
    Find {
        #[command(flatten)]
        log: LogArg,

        #[arg(
            long,
            value_name = "FILE",
            help = "JSON array of {address, test, serial?, time?} candidates"
        )]
        candidates: PathBuf,
    },

    #[command(about = "Print capture statistics for a log")]
    Stats {
        #[command(flatten)]
        log: LogArg,
    },

    #[command(about = "Print the retention path for a single address")]
    Path {
        #[command(flatten)]
        log: LogArg,

        #[arg(long, value_name = "ADDR", help = "Object address, e.g. 0x7f00a0")]
        address: Address,

        #[arg(long, default_value = "(cli)", help = "Test name used in the record")]
        test: String,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ThemeArg {
    Auto,
    Light,
    Dark,
    Plain,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Auto => Theme::Auto,
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Plain => Theme::Plain,
        }
    }
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("leakpath=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<i32, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    if let Some(path) = config.path() {
        debug!(path = %path.display(), "cli.config");
    }
    let finder = ShutdownLeakFinder::new(build_finder_options(&cli.report, &config));
    let ui = Ui::new(cli.theme.into());

    match &cli.command {
        Command::Find { log, candidates } => {
            let candidates = read_candidates(candidates)?;
            let capture = capture_log(&finder, &log.log)?;
            let summary = match cli.format {
                OutputFormat::Json => {
                    let mut sink = JsonLinesSink::new(io::stdout().lock());
                    capture.report(&candidates, &mut sink)?
                }
                OutputFormat::Text => {
                    let mut sink = TextSink::new(&ui);
                    capture.report(&candidates, &mut sink)?
                }
            };
            if summary.candidates == 0 {
                if cli.format == OutputFormat::Text {
                    ui.success("no leaked objects to explain");
                }
                return Ok(0);
            }
            Ok(EXIT_LEAKS_REPORTED)
        }
        Command::Stats { log } => {
            let capture = capture_log(&finder, &log.log)?;
            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(capture.summary())?);
                }
                OutputFormat::Text => print_stats_text(&ui, &capture),
            }
            Ok(0)
        }
        Command::Path { log, address, test } => {
            let capture = capture_log(&finder, &log.log)?;
            let candidate = LeakCandidate::new(*address, test.clone());
            let outcome = capture.search(*address);
            let record = capture.reporter().record(&candidate, &outcome);
            match cli.format {
                OutputFormat::Json => JsonLinesSink::new(io::stdout().lock()).emit(&record)?,
                OutputFormat::Text => println!("{}", record.stack),
            }
            Ok(0)
        }
    }
}

fn build_finder_options(args: &ReportArgs, config: &CliConfig) -> FinderOptions {
    let mut opts = config.finder_options();
    if let Some(subtest) = &args.subtest {
        opts = opts.subtest(subtest.clone());
    }
    if args.strict {
        opts = opts.strict_trace(true);
    }
    if args.no_clean_names {
        opts = opts.clean_names(false);
    }
    if let Some(lines) = args.batch_lines {
        opts = opts.batch_lines(lines);
    }
    opts
}

fn read_candidates(path: &Path) -> Result<Vec<LeakCandidate>, Box<dyn Error>> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open candidates {}: {err}", path.display()))?;
    Ok(load_candidates(BufReader::new(file))?)
}

fn capture_log(finder: &ShutdownLeakFinder, path: &Path) -> Result<Capture, Box<dyn Error>> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open trace log {}: {err}", path.display()))?;
    let mut source = finder.log_source(BufReader::new(file));
    Ok(finder.capture(&mut source)?)
}

fn print_stats_text(ui: &Ui, capture: &Capture) {
    let summary = capture.summary();
    ui.section(
        "Capture",
        [
            ("nodes", summary.nodes.to_string()),
            ("edges", summary.edges.to_string()),
            ("roots", summary.roots.to_string()),
            ("garbage", summary.garbage.to_string()),
            ("max_in_degree", summary.max_in_degree.to_string()),
            ("pulls", summary.pulls.to_string()),
            ("elapsed", format!("{:.2} ms", summary.elapsed_ms)),
        ],
    );
}
