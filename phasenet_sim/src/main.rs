//! PhaseNet simulator CLI
//!
//! Runs oscillator and layout scenarios on generated networks.

use std::path::PathBuf;

use clap::Parser;
use phasenet_sim::scenarios::ScenarioId;
use phasenet_sim::{tagged_path, ScenarioConfig, ScenarioResult, ScenarioRunner};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// PhaseNet simulation CLI
#[derive(Parser, Debug)]
#[command(name = "phasenet-sim")]
#[command(about = "Run oscillator and layout scenarios on generated networks", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,
    
    /// Number of vertices in the generated network
    #[arg(short = 'n', long, default_value = "100")]
    vertices: usize,
    
    /// Engine steps for kuramoto and gossip
    #[arg(long, default_value = "1000")]
    steps: u64,
    
    /// Base coupling strength
    #[arg(short, long, default_value = "1.0")]
    coupling: f64,
    
    /// Layout iterations
    #[arg(long, default_value = "100")]
    iterations: usize,
    
    /// Scenario to run (kuramoto, gossip, layout, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,
    
    /// Write the time series to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
    
    /// Export the laid-out network as JSON
    #[arg(long)]
    export: Option<PathBuf>,
    
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    
    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    
    // Initialize logging; stderr keeps --json output clean
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
    
    if !args.json {
        info!("PhaseNet Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
    
    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available scenarios: kuramoto, gossip, layout, all");
            std::process::exit(1);
        })]
    };
    
    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };
    
    let base = ScenarioConfig::default()
        .with_seed(seed)
        .with_vertices(args.vertices)
        .with_steps(args.steps)
        .with_coupling(args.coupling)
        .with_layout_iterations(args.iterations);
    let several = scenarios.len() > 1;
    
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;
    
    for scenario in &scenarios {
        let mut config = base.clone();
        // One file per scenario when running several
        if let Some(path) = &args.output {
            if scenario.has_time_series() {
                config.output = Some(if several { tagged_path(path, *scenario) } else { path.clone() });
            }
        }
        if let Some(path) = &args.export {
            config.export = Some(if several { tagged_path(path, *scenario) } else { path.clone() });
        }
        
        if !args.json {
            info!("▶ {}: {}", scenario.name(), scenario.description());
        }
                match ScenarioRunner::new(config).run(*scenario) {
            Ok(result) => {
                if !args.json {
                    if result.passed {
                        info!("✓ {} (seed={}) PASSED", scenario.name(), seed);
                    } else {
                        error!(
                            "✗ {} (seed={}) FAILED: {}",
                            scenario.name(),
                            seed,
                            result.failure_reason.as_deref().unwrap_or("unknown")
                        );
                    }
                }
                if !result.passed {
                    failed_count += 1;
                }
                all_results.push(result);
            }
            Err(e) => {
                error!("✗ {} (seed={}) could not run: {}", scenario.name(), seed, e);
                failed_count += 1;
            }
        }
    }
    
    let total = scenarios.len();
    let passed = total - failed_count;
    
    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        
        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
        }
    }
    
    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
