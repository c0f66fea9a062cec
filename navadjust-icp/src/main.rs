//! navadjust-icp - align swath bathymetry crossings with ICP
//!
//! # Usage
//!
//! ```bash
//! # All tied crossings with default settings
//! navadjust-icp survey.navp
//!
//! # Every crossing overlapping more than 30%, 8 workers
//! navadjust-icp survey.navp --all --min-overlap 30 --workers 8
//!
//! # One crossing, verbose, with PLY dumps
//! navadjust-icp survey.navp --crossing 3:1/4:0 -v --dump-dir dumps
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use navadjust_icp::engine::CloudObserver;
use navadjust_icp::io::snapshot;
use navadjust_icp::{AppConfig, CrossingScheduler, DebugDump, ResultLog};

#[derive(Parser, Debug)]
#[command(name = "navadjust-icp")]
#[command(about = "Estimate rigid offsets between overlapping bathymetry sections")]
struct Args {
    /// Project snapshot file
    project: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Minimum crossing overlap (percent, exclusive)
    #[arg(long)]
    min_overlap: Option<u32>,

    /// Start from a zero rough translation instead of tie offsets
    #[arg(long)]
    ignore_ties: bool,

    /// Include crossings without ties
    #[arg(long)]
    all: bool,

    /// Worker threads (capped at 8)
    #[arg(long)]
    workers: Option<usize>,

    /// Align only this crossing (F1:S1/F2:S2)
    #[arg(long)]
    crossing: Option<String>,

    /// ICP iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Correspondence distance cutoff (meters, 0 disables)
    #[arg(long)]
    max_distance: Option<f64>,

    /// Fixed overlap fraction for trimming, in (0, 1]
    #[arg(long)]
    overlap: Option<f64>,

    /// Allow several source points to share one target point
    #[arg(long)]
    no_one_to_one: bool,

    /// Directory for debug PLY dumps
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Apply command line overrides on top of the file configuration.
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(v) = args.min_overlap {
        config.scheduler.min_overlap = v;
    }
    if args.ignore_ties {
        config.scheduler.ignore_ties = true;
    }
    if args.all {
        config.scheduler.include_untied = true;
    }
    if let Some(v) = args.workers {
        config.scheduler.workers = v;
    }
    if let Some(ref v) = args.crossing {
        config.scheduler.crossing = Some(v.clone());
    }
    if let Some(v) = args.max_iterations {
        config.alignment.max_iterations = v;
    }
    if let Some(v) = args.max_distance {
        config.alignment.max_correspondence_distance = v;
    }
    if let Some(v) = args.overlap {
        config.alignment.overlap_fraction = Some(v);
    }
    if args.no_one_to_one {
        config.alignment.one_to_one = false;
    }
    if let Some(ref v) = args.dump_dir {
        config.debug.dump_dir = v.clone();
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &args);
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        std::process::exit(1);
    }

    let project = match snapshot::load(&args.project) {
        Ok(project) => project,
        Err(e) => {
            log::error!("Failed to load project {}: {}", args.project.display(), e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Project '{}': {} sections, {} crossings",
        project.name,
        project.section_count(),
        project.crossings.len()
    );

    let crossing_key = match config.scheduler.crossing_key() {
        Ok(key) => key,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    let dump = match crossing_key {
        Some(ref key) if args.verbose > 0 => Some(DebugDump::for_crossing(
            &config.debug.dump_dir,
            key,
            config.debug.color_by_depth,
        )),
        _ => None,
    };

    let results = ResultLog::stdout();
    results.write_header();

    let scheduler = CrossingScheduler::new(&project, config.scheduler, config.alignment);
    let observer = dump.as_ref().map(|d| d as &dyn CloudObserver);
    match scheduler.run(&results, observer) {
        Ok(summary) => results.summary(&summary),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
