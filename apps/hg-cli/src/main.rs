use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hg_config::DesignConfig;
use hg_design::{AutoResizeController, DesignReport, TerminalStatus};

mod scenario;

#[derive(Parser)]
#[command(name = "hg-cli")]
#[command(about = "HeatGrid CLI - District heating network design tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file and its network topology
    Validate {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Path to a design configuration YAML (defaults apply if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Size and solve a scenario
    Design {
        /// Path to the scenario YAML file
        scenario_path: PathBuf,
        /// Path to a design configuration YAML (defaults apply if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the full report as JSON to this path instead of a summary
        #[arg(long)]
        json: Option<PathBuf>,
        /// Abort the run after this many seconds
        #[arg(long)]
        timeout_s: Option<f64>,
    },
    /// Print the default configuration as YAML
    DefaultConfig,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] hg_config::ConfigurationError),

    #[error(transparent)]
    Net(#[from] hg_net::NetError),

    #[error(transparent)]
    Design(#[from] hg_design::DesignError),

    #[error("Scenario error: {what}")]
    Scenario { what: String },
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            scenario_path,
            config,
        } => cmd_validate(&scenario_path, config.as_deref()),
        Commands::Design {
            scenario_path,
            config,
            json,
            timeout_s,
        } => cmd_design(&scenario_path, config.as_deref(), json.as_deref(), timeout_s),
        Commands::DefaultConfig => cmd_default_config(),
    }
}

fn load_config(path: Option<&Path>) -> Result<DesignConfig, CliError> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&text)?
        }
        None => DesignConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn cmd_validate(scenario_path: &Path, config_path: Option<&Path>) -> Result<(), CliError> {
    println!("Validating scenario: {}", scenario_path.display());
    let config = load_config(config_path)?;
    let scenario = scenario::load_scenario(scenario_path, &config)?;

    // Build the network without solving; topology errors surface here.
    let network = hg_net::NetworkGraphBuilder::new(&config).build(
        &scenario.streets,
        &scenario.buildings,
        &scenario.connections,
        scenario.plant_node,
    )?;

    println!("✓ Scenario is valid");
    println!("  Buildings: {}", scenario.buildings.len());
    println!("  Street nodes: {}", scenario.streets.node_count());
    println!("  Network nodes: {}", network.nodes().len());
    println!("  Pipes: {}", network.edges().len());
    Ok(())
}

fn cmd_design(
    scenario_path: &Path,
    config_path: Option<&Path>,
    json_out: Option<&Path>,
    timeout_s: Option<f64>,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let scenario = scenario::load_scenario(scenario_path, &config)?;
    println!("Designing scenario: {}", scenario.name);

    let mut controller = AutoResizeController::new(&config);
    if let Some(seconds) = timeout_s {
        controller = controller.with_deadline(Instant::now() + Duration::from_secs_f64(seconds));
    }
    let started = Instant::now();
    let run = controller.run(
        &scenario.streets,
        &scenario.buildings,
        &scenario.connections,
        scenario.plant_node,
    )?;
    let elapsed = started.elapsed().as_secs_f64();

    match run.status {
        TerminalStatus::ConvergedCompliant => println!("✓ Design complies ({elapsed:.2}s)"),
        status => println!("✗ Design ended with status: {} ({elapsed:.2}s)", status.as_str()),
    }
    println!("  Run id: {}", run.id);
    println!("  Resize iterations: {}", run.iterations);
    println!("  Pipes: {}", run.network.edges().len());
    println!("  Total pipe cost: {:.0} EUR", run.total_cost_eur);
    println!(
        "  Violations: {} ({} hard)",
        run.compliance.violations.len(),
        run.compliance.hard_violations().count()
    );
    for warning in &run.warnings {
        println!("  Warning on pipe {}: {:?}", warning.edge, warning.warning);
    }

    if let Some(path) = json_out {
        let report = DesignReport::from_run(&run);
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        println!("✓ Report written to {}", path.display());
    }
    Ok(())
}

fn cmd_default_config() -> Result<(), CliError> {
    let config = DesignConfig::default();
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
