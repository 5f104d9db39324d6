// Entry point and high-level CLI flow.
//
// - Option [1] loads the CSV and prints load diagnostics.
// - Option [2] runs the analysis, writes the report files and prints the
//   text report. Afterwards the user can go back to the menu or exit.
// - `--batch` does load + analyse + write once and exits.
use anyhow::{bail, Context};
use clap::Parser;
use once_cell::sync::Lazy;
use project_scorer::loader::{self, LoadReport};
use project_scorer::types::Record;
use project_scorer::util::format_int;
use project_scorer::{output, reports, run_pipeline, AnalysisOutcome, PipelineConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "project-scorer", about = "Rank projects by trend, efficiency and budget discipline")]
struct Args {
    /// Input CSV file
    #[arg(short, long, default_value = "AIProjectDataSet.csv")]
    input: PathBuf,

    /// Directory for the generated report files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Field delimiter of the input file
    #[arg(short, long, default_value_t = ';')]
    delimiter: char,

    /// JSON file overriding pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed of the outlier detector
    #[arg(long)]
    seed: Option<u64>,

    /// Number of performance tiers
    #[arg(long)]
    clusters: Option<usize>,

    /// Expected share of outliers, in (0, 0.5]
    #[arg(long)]
    contamination: Option<f64>,

    /// Run once without the interactive menu
    #[arg(long)]
    batch: bool,
}

// Loaded records survive between menu choices so the file is read once.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<Record>>,
}

fn build_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(k) = args.clusters {
        config.cluster_count = k;
    }
    if let Some(c) = args.contamination {
        config.contamination = c;
    }
    config.validate()?;
    Ok(config)
}

fn delimiter_byte(args: &Args) -> anyhow::Result<u8> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    Ok(args.delimiter as u8)
}

/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Data loaded: {} rows read, {} usable, {} distinct projects.",
        format_int(report.total_rows),
        format_int(report.loaded_rows),
        format_int(report.distinct_projects)
    );
    if report.skipped_rows > 0 {
        println!(
            "Note: {} rows skipped (missing project name or year).",
            format_int(report.skipped_rows)
        );
    }
    println!();
}

fn write_outputs(outcome: &AnalysisOutcome, dir: &std::path::Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    output::write_csv(dir.join("ranked_projects.csv"), &reports::ranked_rows(outcome))?;
    output::write_csv(dir.join("cluster_profiles.csv"), &reports::cluster_rows(outcome))?;
    output::write_csv(dir.join("scatter_points.csv"), &reports::scatter_points(outcome))?;
    output::write_json(dir.join("analysis_summary.json"), &reports::summary(outcome))?;
    Ok(())
}

fn analyse_and_report(records: &[Record], config: &PipelineConfig, dir: &std::path::Path) -> anyhow::Result<()> {
    let outcome = run_pipeline(records, config).context("analysis failed")?;
    println!("{}", reports::render_text_report(&outcome));
    println!("Tier profiles:");
    println!("{}\n", output::preview_table_rows(&reports::cluster_rows(&outcome), config.cluster_count));
    write_outputs(&outcome, dir)?;
    println!("Outputs saved to {}\n", dir.display());
    Ok(())
}

fn handle_load(args: &Args, delimiter: u8) {
    match loader::load_records(&args.input, delimiter) {
        Ok((data, report)) => {
            print_load_report(&report);
            if let Ok(mut state) = APP_STATE.lock() {
                state.data = Some(data);
            }
        }
        Err(e) => {
            error!(error = %e, "load failed");
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn handle_generate(args: &Args, config: &PipelineConfig) {
    let data = APP_STATE.lock().ok().and_then(|state| state.data.clone());
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    if let Err(e) = analyse_and_report(&data, config, &args.output_dir) {
        eprintln!("Error: {:#}\n", e);
    }
}

fn run_batch(args: &Args, config: &PipelineConfig, delimiter: u8) -> anyhow::Result<()> {
    let (records, report) = loader::load_records(&args.input, delimiter)
        .with_context(|| format!("loading {}", args.input.display()))?;
    print_load_report(&report);
    analyse_and_report(&records, config, &args.output_dir)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let delimiter = delimiter_byte(&args)?;
    info!(input = %args.input.display(), seed = config.seed, clusters = config.cluster_count, "starting");

    if args.batch {
        return run_batch(&args, &config, delimiter);
    }

    loop {
        println!("Project Performance Analysis");
        println!("[1] Load the file");
        println!("[2] Run analysis & generate reports\n");
        let Some(choice) = read_choice() else { break };
        match choice.as_str() {
            "1" => handle_load(&args, delimiter),
            "2" => {
                println!();
                handle_generate(&args, &config);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
    Ok(())
}
