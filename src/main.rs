//! `firmo`: CLI entry point wiring [`cli::Args`] to [`firmo::orchestrator::Orchestrator`].

mod cli;
mod host;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use cli::{Args, Commands, ConsoleFormat};
use firmo::config::CONFIG_FILENAME;
use firmo::error::FirmoError;
use firmo::model::{FileResult, TestStatus};
use firmo::orchestrator::{Options, Orchestrator};
use host::FixtureLoader;

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let (known_args, overrides) = cli::split_overrides(raw_args.into_iter());
    let args = Args::parse_from(known_args);

    match run(args, overrides) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn run(args: Args, overrides: Vec<(String, String)>) -> Result<ExitCode, FirmoError> {
    if let Some(Commands::Run { file, json }) = args.command {
        return run_worker(&file, json);
    }

    if args.create_config {
        return run_create_config();
    }

    let work_dir = std::env::current_dir().map_err(FirmoError::from)?;
    let early_config = firmo::config::load(&work_dir, args.config.as_deref()).unwrap_or_default();
    firmo::logging::init(&early_config.logging);

    let options = Options {
        paths: args.paths,
        pattern: args.pattern,
        filter: args.filter,
        config_path: args.config,
        coverage: args.coverage || args.coverage_debug,
        quality: args.quality,
        quality_level: args.quality_level,
        threshold: args.threshold,
        watch: args.watch,
        interactive: args.interactive,
        parallel: args.parallel,
        jobs: args.jobs,
        report: args.report,
        report_dir: args.report_dir,
        report_formats: args.report_formats,
        overrides,
    };

    let orchestrator = Orchestrator::new(FixtureLoader);
    let outcome = orchestrator.run(&options)?;

    if args.json {
        let payload = serde_json::json!({
            "success": outcome.success,
            "files": outcome.file_results,
            "report_paths": outcome.report_paths,
        });
        println!("{}", serde_json::to_string_pretty(&payload).map_err(FirmoError::from)?);
    } else {
        print_console(&outcome.file_results, args.verbose, args.console_format);
        for path in &outcome.report_paths {
            eprintln!("{}: wrote {}", "Report".blue(), path.display());
        }
    }

    Ok(if outcome.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// The mode `--parallel` workers run in (§4.9): evaluate one file, print its
/// FileResult bracketed by the exact markers the parent scans for.
fn run_worker(file: &PathBuf, json: bool) -> Result<ExitCode, FirmoError> {
    firmo::logging::init(&firmo::config::LoggingSection::default());
    let options = Options { paths: vec![file.clone()], report: false, ..Options::default() };
    let orchestrator = Orchestrator::new(FixtureLoader);
    let outcome = orchestrator.run(&options)?;

    let result = outcome.file_results.into_iter().next().unwrap_or_else(|| {
        FileResult::structural_failure(file.clone(), FirmoError::execution("worker produced no file result"), 0.0)
    });

    if !json {
        print_console(std::slice::from_ref(&result), false, ConsoleFormat::Default);
    }

    let serialized = serde_json::to_string(&result).map_err(FirmoError::from)?;
    println!("{}", firmo::parallel::RESULTS_JSON_BEGIN);
    println!("{serialized}");
    println!("{}", firmo::parallel::RESULTS_JSON_END);

    Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_create_config() -> Result<ExitCode, FirmoError> {
    let path = std::env::current_dir().map_err(FirmoError::from)?.join(CONFIG_FILENAME);
    if path.exists() {
        eprintln!("{}: {} already exists", "Warning".yellow(), path.display());
        return Ok(ExitCode::SUCCESS);
    }
    let default_config = firmo::config::Config::default();
    let json = serde_json::to_string_pretty(&default_config).map_err(FirmoError::from)?;
    std::fs::write(&path, json).map_err(FirmoError::from)?;
    println!("{}: created {}", "Done".green().bold(), path.display());
    Ok(ExitCode::SUCCESS)
}

fn print_console(results: &[FileResult], verbose: bool, format: ConsoleFormat) {
    match format {
        ConsoleFormat::Default => print_console_default(results, verbose),
        ConsoleFormat::Dot => print_console_dots(results),
        ConsoleFormat::Summary => print_console_summary(results),
        ConsoleFormat::JsonDumpInternal => {
            if let Ok(dump) = serde_json::to_string_pretty(results) {
                println!("{dump}");
            }
        }
    }
}

fn print_console_default(results: &[FileResult], verbose: bool) {
    for file in results {
        for test in &file.results {
            match test.status {
                TestStatus::Pass => println!("{} {}", "PASS".green().bold(), test.path_string),
                TestStatus::Fail => {
                    println!("{} {}", "FAIL".red().bold(), test.path_string);
                    if let Some(message) = &test.error_message {
                        println!("       {message}");
                    }
                }
                TestStatus::Skip => println!("{} {}", "SKIP".yellow().bold(), test.path_string),
                TestStatus::Pending => println!("{} {}", "PEND".yellow().bold(), test.path_string),
            }
        }
        if verbose || !file.success {
            println!(
                "{}: {} passed, {} failed, {} skipped ({:.3}s)",
                file.file_path.display(),
                file.passes,
                file.errors,
                file.skipped,
                file.elapsed_s
            );
        }
    }
}

fn print_console_dots(results: &[FileResult]) {
    for file in results {
        for test in &file.results {
            let dot = match test.status {
                TestStatus::Pass => ".".green(),
                TestStatus::Fail => "F".red().bold(),
                TestStatus::Skip | TestStatus::Pending => "S".yellow(),
            };
            print!("{dot}");
        }
    }
    println!();
    print_console_summary(results);
}

fn print_console_summary(results: &[FileResult]) {
    let passes: usize = results.iter().map(|f| f.passes).sum();
    let errors: usize = results.iter().map(|f| f.errors).sum();
    let skipped: usize = results.iter().map(|f| f.skipped).sum();
    let elapsed: f64 = results.iter().map(|f| f.elapsed_s).sum();
    println!("{passes} passed, {errors} failed, {skipped} skipped ({elapsed:.3}s across {} files)", results.len());
}
