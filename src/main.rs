//! TC Kimlik CLI - command-line front end for identity number validation
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to validation and scanning operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and the checksum core

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use tc_kimlik::config::DEFAULT_CONFIG_FILES;
use tc_kimlik::{
    diagnose, normalize, AnalysisOptions, InputStatus, KimlikConfig, KimlikError, KimlikScanner,
    OutputFormat, Rejection, ReportFormatter, ReportOptions, ScanInput, IDENTITY_LENGTH,
};

/// Exit code when every checked number was valid
const EXIT_OK: i32 = 0;
/// Exit code when at least one invalid number was found
const EXIT_INVALID: i32 = 1;
/// Exit code for usage, input and I/O errors
const EXIT_ERROR: i32 = 2;

/// TC Kimlik - Turkish national identity number validator
#[derive(Parser)]
#[command(name = "tc-kimlik")]
#[command(version)]
#[command(about = "Validate Turkish national identity numbers and find them in text")]
#[command(long_about = "Validates TC Kimlik No values with the official checksum rules, and scans text, files or directory trees for candidate numbers, classifying each one as valid or invalid.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate one or more TC numbers
    Check {
        /// Numbers to validate (spaces and hyphens are ignored)
        #[arg(required = true)]
        numbers: Vec<String>,

        /// Only set the exit code
        #[arg(short, long)]
        quiet: bool,
    },

    /// Find and classify TC numbers in text, files or directories
    Scan {
        /// Files or directories to scan
        paths: Vec<PathBuf>,

        /// Scan this text instead of files
        #[arg(short, long, conflicts_with_all = ["paths", "stdin"])]
        text: Option<String>,

        /// Read the text to scan from standard input
        #[arg(long, conflicts_with = "paths")]
        stdin: bool,

        /// Output format [default: taken from the --output extension, else human]
        #[arg(short, long, value_enum)]
        format: Option<OutputFormatArg>,

        /// Save the report to this file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave invalid numbers out of the report
        #[arg(long)]
        no_invalid: bool,

        /// Explain why each invalid number failed
        #[arg(long)]
        reasons: bool,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Ignore .kimlikignore files
        #[arg(long)]
        no_ignore: bool,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Stop at the first unreadable file
        #[arg(long)]
        fail_fast: bool,

        /// Maximum number of files to scan
        #[arg(long)]
        max_files: Option<usize>,
    },

    /// Show the checksum calculation for a number
    Explain {
        /// Number to explain
        number: String,
    },

    /// Watch files and re-scan on changes
    Watch {
        /// Path to watch (defaults to current directory)
        path: Option<PathBuf>,

        /// File patterns to watch (glob patterns)
        #[arg(short, long, action = clap::ArgAction::Append)]
        pattern: Vec<String>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value = "500")]
        delay: u64,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    Csv,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Csv => OutputFormat::Csv,
        }
    }
}

/// Arguments of the scan command
struct ScanArgs {
    input: ScanInput,
    format: OutputFormat,
    output: Option<PathBuf>,
    report_options: ReportOptions,
    analysis_options: AnalysisOptions,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_ERROR);
        }
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<i32> {
    let use_colors = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Commands::Check { numbers, quiet } => Ok(run_check(&numbers, quiet)?),
        Commands::Scan {
            paths,
            text,
            stdin,
            format,
            output,
            no_invalid,
            reasons,
            exclude,
            no_ignore,
            no_parallel,
            fail_fast,
            max_files,
        } => {
            let input = match (text, stdin) {
                (Some(text), _) => ScanInput::Text(text),
                (None, true) => ScanInput::Stdin,
                (None, false) if paths.is_empty() => ScanInput::Paths(vec![PathBuf::from(".")]),
                (None, false) => ScanInput::Paths(paths),
            };

            let args = ScanArgs {
                input,
                format: resolve_format(format, output.as_deref()),
                report_options: ReportOptions {
                    // Saved reports never carry escape codes
                    use_colors: use_colors && output.is_none(),
                    show_invalid: !no_invalid,
                    show_reasons: reasons,
                },
                output,
                analysis_options: AnalysisOptions {
                    parallel: !no_parallel,
                    fail_fast,
                    max_files,
                    exclude_patterns: exclude,
                    ignore_ignore_files: no_ignore,
                },
            };

            run_scan(cli.config, args).await
        }
        Commands::Explain { number } => Ok(run_explain(&number)),
        Commands::Watch { path, pattern, delay } => {
            Ok(run_watch(cli.config, path, pattern, delay, use_colors).await?)
        }
        Commands::ValidateConfig { config_file } => {
            Ok(run_validate_config(config_file.or(cli.config)))
        }
    }
}

/// Load the explicit config file, or the first default one in the working directory
fn load_config(config_path: Option<&Path>) -> Result<KimlikConfig, KimlikError> {
    match config_path {
        Some(path) => KimlikConfig::load_from_file(path),
        None => KimlikConfig::discover("."),
    }
}

fn run_check(numbers: &[String], quiet: bool) -> Result<i32, KimlikError> {
    if numbers.iter().all(|n| n.trim().is_empty()) {
        return Err(KimlikError::input("Please enter a TC number"));
    }

    let mut exit_code = EXIT_OK;

    for input in numbers {
        let (line, valid) = check_line(input);
        if !valid {
            exit_code = EXIT_INVALID;
        }
        if !quiet {
            println!("{line}");
        }
    }

    Ok(exit_code)
}

/// Outcome line for one checked value; blank values are skipped without failing the run
fn check_line(input: &str) -> (String, bool) {
    let input = input.trim();
    if input.is_empty() {
        return ("⚠️  Please enter a TC number".to_string(), true);
    }

    match diagnose(input) {
        Ok(number) => (format!("✅ {}: Valid TC Number", number.formatted()), true),
        Err(rejection) => {
            let line = match (rejection, InputStatus::of(input)) {
                (Rejection::Malformed { .. }, status @ InputStatus::Incomplete { .. }) => {
                    format!("⚠️  {input}: {}", status.message())
                }
                _ => format!("❌ {input}: Invalid TC Number ({rejection})"),
            };
            (line, false)
        }
    }
}

async fn run_scan(config_path: Option<PathBuf>, args: ScanArgs) -> anyhow::Result<i32> {
    let config = load_config(config_path.as_deref())?;
    let scanner = KimlikScanner::new_with_config(config)?
        .with_report_formatter(ReportFormatter::new(args.report_options));

    let report = scanner.analyze(args.input, &args.analysis_options).await?;
    let format = args.format;

    match &args.output {
        Some(path) => {
            scanner
                .save_report(&report, format, path)
                .with_context(|| format!("Could not save results to {}", path.display()))?;
            eprintln!("Results saved to {}", path.display());
        }
        None => println!("{}", scanner.format_report(&report, format)?),
    }

    if format == OutputFormat::Human {
        eprintln!(
            "Analysis complete: {} valid, {} invalid TC numbers found",
            report.summary.valid_count, report.summary.invalid_count
        );
    }

    Ok(if report.has_invalid() { EXIT_INVALID } else { EXIT_OK })
}

/// Explicit `--format`, else the format named by the output file extension, else human
fn resolve_format(arg: Option<OutputFormatArg>, output: Option<&Path>) -> OutputFormat {
    arg.map(OutputFormat::from)
        .or_else(|| {
            output
                .and_then(|path| path.extension())
                .and_then(|ext| OutputFormat::from_str(&ext.to_string_lossy()))
        })
        .unwrap_or(OutputFormat::Human)
}

/// Step-by-step checksum breakdown, and whether the number is valid
fn explain_lines(input: &str) -> (Vec<String>, bool) {
    let normalized = normalize(input.trim());
    let mut lines = vec![format!("🔍 TC Number: {}", input.trim())];

    let digits: Vec<u32> = normalized.chars().filter_map(|c| c.to_digit(10)).collect();
    let all_ascii = normalized.bytes().all(|b| b.is_ascii_digit());

    if digits.len() == IDENTITY_LENGTH && all_ascii {
        let joined = |indices: &[usize]| {
            indices.iter().map(|&i| digits[i].to_string()).collect::<Vec<_>>().join("+")
        };
        let odd_sum: u32 = [0, 2, 4, 6, 8].iter().map(|&i| digits[i]).sum();
        let even_sum: u32 = [1, 3, 5, 7].iter().map(|&i| digits[i]).sum();
        let first_ten_sum: u32 = digits[..10].iter().sum();
        let tenth = (i64::from(odd_sum) * 7 - i64::from(even_sum)).rem_euclid(10);

        lines.push(format!("   Digits: {}", normalized.chars().map(String::from).collect::<Vec<_>>().join(" ")));
        lines.push(format!("   Digits 1,3,5,7,9: {} = {}", joined(&[0, 2, 4, 6, 8]), odd_sum));
        lines.push(format!("   Digits 2,4,6,8: {} = {}", joined(&[1, 3, 5, 7]), even_sum));
        lines.push(format!(
            "   10th digit: ({odd_sum} x 7 - {even_sum}) mod 10 = {tenth} (found {})",
            digits[9]
        ));
        lines.push(format!(
            "   11th digit: {first_ten_sum} mod 10 = {} (found {})",
            first_ten_sum % 10,
            digits[10]
        ));
    }

    let valid = match diagnose(input) {
        Ok(number) => {
            lines.push(format!("✅ Valid TC Number: {}", number.formatted()));
            true
        }
        Err(rejection) => {
            lines.push(format!("❌ Invalid TC Number: {rejection}"));
            false
        }
    };

    (lines, valid)
}

fn run_explain(number: &str) -> i32 {
    let (lines, valid) = explain_lines(number);
    for line in lines {
        println!("{line}");
    }
    if valid { EXIT_OK } else { EXIT_INVALID }
}

async fn run_watch(
    config_path: Option<PathBuf>,
    path: Option<PathBuf>,
    patterns: Vec<String>,
    delay_ms: u64,
    use_colors: bool,
) -> Result<i32, KimlikError> {
    use notify::{Event, RecursiveMode, Result as NotifyResult, Watcher};
    use std::io::{self, Write};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    let watch_path = path.unwrap_or_else(|| PathBuf::from("."));

    let watch_patterns =
        if patterns.is_empty() { vec!["**/*.txt".to_string(), "**/*.csv".to_string()] } else { patterns };

    println!("🔍 Starting TC Kimlik watch mode...");
    println!("📂 Watching: {}", watch_path.display());
    println!("🎯 Patterns: {}", watch_patterns.join(", "));
    println!("⏱️  Debounce delay: {delay_ms}ms");
    println!("Press Ctrl+C to stop watching\n");

    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| match res {
        Ok(event) => {
            if let Err(e) = tx.send(event) {
                tracing::warn!("Error sending event: {}", e);
            }
        }
        Err(e) => tracing::warn!("Watch error: {}", e),
    })
    .map_err(|e| KimlikError::config(format!("Failed to create file watcher: {e}")))?;

    watcher.watch(&watch_path, RecursiveMode::Recursive).map_err(|e| {
        KimlikError::config(format!("Failed to watch path '{}': {}", watch_path.display(), e))
    })?;

    let debounce_duration = Duration::from_millis(delay_ms);
    let mut active_config = config_path;
    let mut last_run = Instant::now();

    println!("🚀 Running initial analysis...");
    run_watch_analysis(&watch_path, active_config.as_deref(), use_colors).await;

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let config_change = is_config_change(&event);
                if config_change.is_none() && !should_trigger_analysis(&event, &watch_patterns) {
                    continue;
                }

                let now = Instant::now();
                if config_change.is_none() && now.duration_since(last_run) < debounce_duration {
                    continue;
                }

                // Clear screen and move cursor to top
                print!("\x1B[2J\x1B[H");
                io::stdout().flush()?;

                if let Some(changed) = config_change {
                    println!("🔄 Configuration file changed: {}", changed.display());
                    active_config = Some(changed);
                } else {
                    println!("📝 File changes detected, running analysis...");
                }

                run_watch_analysis(&watch_path, active_config.as_deref(), use_colors).await;
                last_run = now;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => tokio::task::yield_now().await,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                eprintln!("File watcher disconnected");
                break;
            }
        }
    }

    Ok(EXIT_OK)
}

/// Check if an event touches a file matching the watch patterns
fn should_trigger_analysis(event: &notify::Event, patterns: &[String]) -> bool {
    use notify::EventKind;

    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
        return false;
    }

    event.paths.iter().any(|path| {
        patterns.iter().any(|pattern| {
            glob::Pattern::new(pattern).map(|p| p.matches_path(path)).unwrap_or(false)
        })
    })
}

/// Check if an event indicates a config file change
fn is_config_change(event: &notify::Event) -> Option<PathBuf> {
    use notify::EventKind;

    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return None;
    }

    event
        .paths
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| DEFAULT_CONFIG_FILES.contains(&name))
        })
        .cloned()
}

/// Run one scan for watch mode, reporting failures without leaving the loop
async fn run_watch_analysis(watch_path: &Path, config_path: Option<&Path>, use_colors: bool) {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠️  Failed to load configuration: {e}");
            eprintln!("   Using default configuration instead...");
            KimlikConfig::default()
        }
    };

    let scanner = match KimlikScanner::new_with_config(config) {
        Ok(scanner) => scanner.with_report_formatter(ReportFormatter::new(ReportOptions {
            use_colors,
            ..Default::default()
        })),
        Err(e) => {
            eprintln!("❌ Could not start analysis: {e}");
            return;
        }
    };

    let input = ScanInput::Paths(vec![watch_path.to_path_buf()]);
    let result = scanner.analyze(input, &AnalysisOptions::default()).await.and_then(|report| {
        let formatted = scanner.format_report(&report, OutputFormat::Human)?;
        Ok((report, formatted))
    });

    match result {
        Ok((report, formatted)) => {
            println!("{formatted}");
            println!(
                "📊 Analyzed {} files in {:.1}s",
                report.summary.total_sources,
                report.summary.execution_time_ms as f64 / 1000.0
            );
            println!("⌚ Watching for changes... (Press Ctrl+C to stop)\n");
        }
        Err(e) => eprintln!("❌ Analysis error: {e}"),
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> i32 {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));

    println!("Validating configuration: {}", config_path.display());

    match KimlikConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("📊 Configuration summary:");
            println!("  Path patterns: {}", config.paths.patterns.len());
            println!("  Ignore file: {}", config.ignore_file().unwrap_or_else(|| "(none)".to_string()));
            match config.scan.max_file_size {
                Some(limit) => println!("  Max file size: {limit} bytes"),
                None => println!("  Max file size: unlimited"),
            }
            println!("  Follow links: {}", config.scan.follow_links);
            EXIT_OK
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            EXIT_INVALID
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
