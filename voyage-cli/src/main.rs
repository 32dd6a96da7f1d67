mod report;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use report::{RunReport, generate_console_report, generate_json_report, generate_markdown_report};
use voyage_estimator::{SimulationConfig, SkillInputs, TrialSeeder, VoyageEstimator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for a terminal
    Console,
    /// Markdown table
    Markdown,
    /// Machine-readable JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "voyage-estimator", version)]
#[command(about = "Monte Carlo estimate of how long a crew lasts on a voyage")]
struct Args {
    /// Primary skill value (35% of hazards)
    #[arg(long)]
    primary: f64,

    /// Secondary skill value (25% of hazards)
    #[arg(long)]
    secondary: f64,

    /// The four remaining skill values, comma-separated (10% of hazards each)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    others: Vec<f64>,

    /// Starting antimatter; required unless the config file sets it
    #[arg(long, allow_hyphen_values = true)]
    antimatter: Option<i64>,

    /// Number of refill levels to report beyond the initial run
    #[arg(long)]
    extends: Option<u32>,

    /// Antimatter on hand when resuming a voyage
    #[arg(long)]
    current_am: Option<i64>,

    /// Hours already elapsed when resuming a voyage
    #[arg(long)]
    elapsed_hours: Option<f64>,

    /// Number of simulated trials
    #[arg(long)]
    trials: Option<u32>,

    /// Run seed for reproducible results
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with simulation settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run every trial on the main thread
    #[arg(long)]
    sequential: bool,

    /// Simulate zero or negative inputs instead of rejecting them
    #[arg(long)]
    allow_degenerate: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let skills = skill_inputs(&args)?;
    let mut config = build_config(&args)?;
    let seed = config
        .seed
        .unwrap_or_else(|| TrialSeeder::from_entropy().run_seed());
    config.seed = Some(seed);
    info!("estimating with seed {seed}");

    let start_time = Instant::now();
    let estimator = VoyageEstimator::new(config)
        .strict(!args.allow_degenerate)
        .sequential(args.sequential);
    let result = estimator
        .estimate(&skills)
        .context("voyage estimate failed")?;

    let report = RunReport::new(seed, &skills, estimator.config(), &result);
    write_report(&args, &report, start_time)
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(default_filter)
        .parse_default_env()
        .init();
}

fn skill_inputs(args: &Args) -> Result<SkillInputs> {
    let Ok(other) = <[f64; 4]>::try_from(args.others.as_slice()) else {
        bail!(
            "--others expects exactly 4 comma-separated values, got {}",
            args.others.len()
        );
    };
    Ok(SkillInputs::new(args.primary, args.secondary, other))
}

fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SimulationConfig::from_json_str(&raw)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => {
            let Some(antimatter) = args.antimatter else {
                bail!("--antimatter is required when no --config file is given");
            };
            SimulationConfig::for_voyage(antimatter)
        }
    };

    if let Some(antimatter) = args.antimatter {
        config = config.with_start_resource(antimatter);
    }
    if let Some(extends) = args.extends {
        config = config.with_num_extends(extends);
    }
    if let Some(trials) = args.trials {
        config = config.with_num_trials(trials);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.current_am.is_some() || args.elapsed_hours.is_some() {
        let current = args.current_am.unwrap_or(config.current_resource);
        let elapsed = args.elapsed_hours.unwrap_or(config.elapsed_hours);
        config = config.resuming(current, elapsed);
    }
    Ok(config)
}

fn write_report(args: &Args, report: &RunReport<'_>, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => generate_json_report(&mut output_target, report)?,
        ReportFormat::Markdown => generate_markdown_report(&mut output_target, report)?,
        ReportFormat::Console => {
            generate_console_report(&mut output_target, report, start_time.elapsed())?;
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

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "voyage-estimator",
            "--primary",
            "1000",
            "--secondary",
            "1000",
            "--others",
            "500,500,500,500",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("valid arguments")
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("voyage-cli-{label}-{}", std::process::id()))
    }

    #[test]
    fn others_must_have_four_values() {
        let args = Args::try_parse_from([
            "voyage-estimator",
            "--primary",
            "1",
            "--secondary",
            "1",
            "--others",
            "1,2,3",
            "--antimatter",
            "2500",
        ])
        .unwrap();
        assert!(skill_inputs(&args).is_err());

        let ok = parse(&["--antimatter", "2500"]);
        let skills = skill_inputs(&ok).unwrap();
        assert_eq!(skills.other, [500.0; 4]);
    }

    #[test]
    fn antimatter_is_required_without_config() {
        let args = parse(&[]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--antimatter",
            "2500",
            "--extends",
            "4",
            "--trials",
            "250",
            "--seed",
            "9",
            "--current-am",
            "800",
            "--elapsed-hours",
            "3.5",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.start_resource, 2_500);
        assert_eq!(config.num_extends, 4);
        assert_eq!(config.num_trials, 250);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.current_resource, 800);
        assert!((config.elapsed_hours - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn config_file_is_loaded_then_overridden() {
        let path = temp_path("config.json");
        fs::write(&path, r#"{"start_resource": 3000, "num_trials": 40, "num_extends": 1}"#).unwrap();
        let path_arg = path.to_string_lossy().to_string();
        let args = parse(&["--config", &path_arg, "--trials", "60"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.start_resource, 3_000);
        assert_eq!(config.num_extends, 1);
        assert_eq!(config.num_trials, 60);
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let path = temp_path("bad-config.json");
        fs::write(&path, r#"{"start_resource": 3000, "num_trials": 0}"#).unwrap();
        let path_arg = path.to_string_lossy().to_string();
        let args = parse(&["--config", &path_arg]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn report_format_defaults_to_console() {
        let args = parse(&["--antimatter", "2500"]);
        assert_eq!(args.report, ReportFormat::Console);
        let json = parse(&["--antimatter", "2500", "--report", "json"]);
        assert_eq!(json.report, ReportFormat::Json);
    }

    #[test]
    fn write_report_emits_markdown_to_file() {
        let path = temp_path("report.md");
        let path_arg = path.to_string_lossy().to_string();
        let args = parse(&[
            "--antimatter",
            "2500",
            "--trials",
            "50",
            "--seed",
            "5",
            "--report",
            "markdown",
            "--output",
            &path_arg,
        ]);
        let skills = skill_inputs(&args).unwrap();
        let config = build_config(&args).unwrap();
        let result = VoyageEstimator::new(config.clone()).estimate(&skills).unwrap();
        let report = RunReport::new(5, &skills, &config, &result);
        write_report(&args, &report, Instant::now()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("# Voyage Estimate"));
        assert!(content.contains("| initial |"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
