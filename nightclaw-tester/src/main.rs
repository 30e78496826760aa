mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use nightclaw_game::{BundledContent, StoryLoader};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use logic::{
    GameplayStrategy, LogicTester, ScenarioResult, resolve_seed_inputs, resolve_strategies,
    split_csv,
};

#[derive(Debug, Parser)]
#[command(name = "nightclaw-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs of the Nightclaw story with invariant checks")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "first-choice")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated, decimal or 0x-hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of playthroughs per strategy and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Give up on a playthrough after this many player operations
    #[arg(long, default_value_t = 500)]
    max_turns: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = resolve_strategies(&split_csv(&args.strategies))?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let content = BundledContent;
    let graph = content
        .load_story()
        .context("bundled story failed to load")?;
    let config = content
        .load_config()
        .context("bundled tuning failed to load")?;
    log::info!(
        "loaded {} story nodes, running {} strategies over {} seeds",
        graph.len(),
        strategies.len(),
        seeds.len()
    );

    let tester = LogicTester::new(Arc::new(graph), config, args.max_turns, args.verbose);
    let results = run_strategies(&args, &tester, &strategies, &seeds);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:15} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🐺 Nightclaw Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn run_strategies(
    args: &Args,
    tester: &LogicTester,
    strategies: &[GameplayStrategy],
    seeds: &[u64],
) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Playthroughs".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let mut results = Vec::new();
    for &strategy in strategies {
        let strategy_results = tester.run_strategy(strategy, seeds, args.iterations);
        for result in &strategy_results {
            let mark = if result.passed {
                "✅".green()
            } else {
                "❌".red()
            };
            println!(
                "{mark} {} seed {} - {}/{} clean",
                result.scenario_name, result.seed, result.successful_iterations, result.iterations_run
            );
        }
        results.extend(strategy_results);
    }
    results
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No playthroughs executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            strategies: "first-choice".to_string(),
            list_strategies: false,
            seeds: "1337".to_string(),
            iterations: 1,
            max_turns: 500,
            report: "json".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "nightclaw-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["nightclaw-tester"]);
        assert_eq!(args.strategies, "first-choice");
        assert_eq!(args.iterations, 10);
        assert_eq!(args.max_turns, 500);
        assert_eq!(args.report, "console");
    }

    #[test]
    fn list_strategies_writes_every_key() {
        let path = temp_path("list");
        let args = Args {
            list_strategies: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_strategies(&args).unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        for strategy in GameplayStrategy::ALL {
            assert!(text.contains(strategy.key()));
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn markdown_report_goes_to_file() {
        let path = temp_path("markdown");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Nightclaw Playthrough Results"));
        std::fs::remove_file(path).ok();
    }
}
