//! MPPT simulator entry point: CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use mppt_sim::config::ScenarioConfig;
use mppt_sim::io::export::export_csv;
use mppt_sim::sim::kpi::TrackingReport;
use mppt_sim::sim::types::Sample;
use tracing_subscriber::EnvFilter;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    history_out: Option<String>,
    quiet: bool,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
    #[cfg(feature = "tui")]
    tui: bool,
}

fn print_help() {
    eprintln!("mppt-sim: PV panel and perturb-and-observe MPPT simulator");
    eprintln!();
    eprintln!("Usage: mppt-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --history-out <path>     Export samples to CSV");
    eprintln!("  --quiet                  Print only the tracking report");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after simulation");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    #[cfg(feature = "tui")]
    eprintln!("  --tui                    Run interactively in the terminal");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info, written to stderr).");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        history_out: None,
        quiet: false,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
        #[cfg(feature = "tui")]
        tui: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--history-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --history-out requires a path argument");
                    process::exit(1);
                }
                cli.history_out = Some(args[i].clone());
            }
            "--quiet" | "-q" => {
                cli.quiet = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            #[cfg(feature = "tui")]
            "--tui" => {
                cli.tui = true;
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides `default_level`.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();

    #[cfg(feature = "tui")]
    init_logging(if cli.tui { "off" } else { "info" });
    #[cfg(not(feature = "tui"))]
    init_logging("info");

    // Load config: --scenario takes priority, then --preset, then baseline default
    let (scenario, name) = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => (cfg, path.clone()),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref preset) = cli.preset {
        match ScenarioConfig::from_preset(preset) {
            Ok(cfg) => (cfg, preset.clone()),
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        (ScenarioConfig::baseline(), "baseline".to_string())
    };

    #[cfg(feature = "tui")]
    if cli.tui {
        let app = match mppt_sim::tui::runtime::App::new(scenario, &name) {
            Ok(app) => app,
            Err(errors) => {
                for e in &errors {
                    eprintln!("{e}");
                }
                process::exit(1);
            }
        };
        if let Err(e) = mppt_sim::tui::run(app) {
            eprintln!("error: TUI crashed: {e}");
            process::exit(1);
        }
        return;
    }

    // Validate and build
    let built = match scenario.build() {
        Ok(built) => built,
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            process::exit(1);
        }
    };
    tracing::info!(scenario = %name, "scenario loaded");

    let mut engine = built.into_engine();
    if !cli.quiet {
        engine.add_sink(|s: &Sample| println!("{s}"));
    }
    engine.run();

    let report = TrackingReport::from_history(
        engine.history().samples(),
        engine.config().step_s,
        engine.environment_changes_applied(),
    );
    println!("\n{report}");

    // Export CSV if requested
    if let Some(ref path) = cli.history_out {
        if let Err(e) = export_csv(engine.history().samples(), Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        tracing::info!(path = %path, "history written");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let config = engine.config().clone();
        let panel = engine.panel().clone();
        let state = Arc::new(mppt_sim::api::AppState {
            config,
            report,
            samples: engine.into_history().into_samples(),
            panel,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(mppt_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
