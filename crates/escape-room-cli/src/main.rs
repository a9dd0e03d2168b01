//! Governance Escape Room CLI
//!
//! Serves the HTTP API, grades selections from the command line and plays a
//! persistent session in the terminal.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use escape_room_engine::{
    create_router, grade_submission, AppState, Config, ContentStore, ControlCategory, FileStorage,
    GameSession, GameStatus, GradingResult, HintArbiter, Scenario,
};
use escape_room_report::{json::JsonGenerator, MarkdownGenerator, SessionReport};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// Governance Escape Room
///
/// Respond to Microsoft 365 Copilot governance incidents by picking the
/// controls that would have prevented them, then get graded against an
/// expert rubric.
#[derive(Parser, Debug)]
#[command(name = "escape-room")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: escape-room.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// List the control library by category
    Controls,
    /// List the scenarios
    Scenarios,
    /// Grade a selection against a scenario's rubric
    Grade {
        /// Scenario id
        #[arg(short, long)]
        scenario: String,
        /// Selected control ids
        #[arg(value_name = "CONTROL")]
        controls: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Play a session that persists between invocations
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Start a new game, replacing any saved one
    Start,
    /// Show the current scenario and selection
    Status,
    /// Select or deselect controls
    Toggle {
        /// Control ids
        #[arg(value_name = "CONTROL", required = true)]
        controls: Vec<String>,
    },
    /// Submit the current selection for grading
    Submit {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move on to the next scenario
    Advance,
    /// Ask for a hint
    Hint {
        /// Category to focus on, e.g. data-access
        #[arg(long)]
        category: Option<String>,
    },
    /// Show the session report
    Report {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Also write the report to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Discard the saved game
    Reset,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let content = ContentStore::builtin()?;

    match args.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Controls => {
            print_controls(&content);
            Ok(())
        }
        Command::Scenarios => {
            print_scenarios(&content);
            Ok(())
        }
        Command::Grade {
            scenario,
            controls,
            json,
        } => {
            let result = grade_submission(&content, &scenario, &controls)?;
            let title = content
                .scenario(&scenario)
                .map_or(scenario.as_str(), |s| s.title.as_str());
            print_result(title, &result, json)
        }
        Command::Session(command) => {
            let storage = FileStorage::new(&config.state_dir);
            let mut session = GameSession::new(content, storage, &config);
            run_session(&mut session, &config, command).await
        }
    }
}

/// Loads configuration from the specified path or default location, then
/// applies environment overrides.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path)?
        }
        None => Config::load()?,
    };
    config.apply_env_overrides()?;
    Ok(config)
}

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let provider = config.hints.provider;
    let router = create_router(AppState::new(config)?);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    tracing::info!(%addr, provider = provider.as_str(), "HTTP API server started");
    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            anyhow::anyhow!("HTTP server error: {e}")
        })
}

async fn run_session(
    session: &mut GameSession<FileStorage>,
    config: &Config,
    command: SessionCommand,
) -> anyhow::Result<()> {
    match command {
        SessionCommand::Start => {
            session.reset();
            session.start();
            print_status(session);
        }
        SessionCommand::Status => print_status(session),
        SessionCommand::Toggle { controls } => {
            ensure_playing(session)?;
            for id in &controls {
                if session.content().control(id).is_none() {
                    anyhow::bail!(
                        "Unknown control: '{id}'\n\nSuggestion: Run 'escape-room controls' to list control ids"
                    );
                }
            }
            for id in &controls {
                session.toggle_control(id);
            }
            print_selection(session);
        }
        SessionCommand::Submit { json } => {
            ensure_playing(session)?;
            let Some(result) = session.submit()? else {
                anyhow::bail!(
                    "Nothing to submit\n\nSuggestion: Select at least one control with 'escape-room session toggle <CONTROL>'"
                );
            };
            let title = session
                .state()
                .scenario_results
                .last()
                .map_or_else(String::new, |r| r.scenario.title.clone());
            print_result(&title, &result, json)?;
            if !json {
                if session.has_results() {
                    println!("All scenarios done. Run 'escape-room session report' for the summary.");
                } else {
                    println!("Run 'escape-room session advance' for the next scenario.");
                }
            }
        }
        SessionCommand::Advance => {
            if !session.is_scenario_complete() {
                anyhow::bail!("No completed scenario to advance from (status: {})", session.state().status);
            }
            session.advance();
            print_status(session);
        }
        SessionCommand::Hint { category } => {
            ensure_playing(session)?;
            let category = category.as_deref().map(parse_category).transpose()?;
            let arbiter = HintArbiter::from_config(&config.hints, ContentStore::builtin()?)?;
            match session.request_hint(&arbiter, category).await {
                Ok(Some(hint)) => {
                    println!("Hint: {}", hint.hint);
                    if let Some(url) = &hint.learn_more_url {
                        println!("Learn more: {url}");
                    }
                    println!("Hints remaining: {}", session.hints_remaining());
                }
                Ok(None) => println!("No game in progress."),
                Err(e) => anyhow::bail!("{}", e.user_message()),
            }
        }
        SessionCommand::Report { json, output } => {
            let report = SessionReport::from_state(session.state())?;
            if json {
                println!("{}", JsonGenerator::new(&report).generate_pretty()?);
            } else {
                print!("{}", MarkdownGenerator::for_session(&report).generate());
            }
            if let Some(path) = output {
                JsonGenerator::new(&report).write_to_file(&path, true)?;
                println!("Report written to {}", path.display());
            }
        }
        SessionCommand::Reset => {
            session.reset();
            println!("Session reset.");
        }
    }
    Ok(())
}

fn ensure_playing(session: &GameSession<FileStorage>) -> anyhow::Result<()> {
    if session.state().status == GameStatus::Idle {
        anyhow::bail!("No game in progress\n\nSuggestion: Run 'escape-room session start'");
    }
    if !session.is_playing() {
        anyhow::bail!(
            "Current scenario is already submitted (status: {})",
            session.state().status
        );
    }
    Ok(())
}

fn parse_category(id: &str) -> anyhow::Result<ControlCategory> {
    ControlCategory::from_id(id).ok_or_else(|| {
        let known: Vec<&str> = ControlCategory::ALL.iter().map(ControlCategory::as_str).collect();
        anyhow::anyhow!("Unknown category '{id}': expected one of {}", known.join(", "))
    })
}

fn print_result(title: &str, result: &GradingResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", JsonGenerator::new(result).generate_pretty()?);
    } else {
        print!("{}", MarkdownGenerator::for_result(title, result).generate());
    }
    Ok(())
}

fn print_controls(content: &ContentStore) {
    for (category, controls) in content.grouped_by_category() {
        println!("{} ({category})", category.label());
        for control in controls {
            println!("  {} {:<32} {}", control.icon, control.id, control.name);
        }
        println!();
    }
}

fn print_scenarios(content: &ContentStore) {
    for scenario in content.scenarios() {
        println!("{} {:<32} {}", scenario.icon, scenario.id, scenario.title);
    }
}

fn print_scenario(scenario: &Scenario) {
    println!("{} {}", scenario.icon, scenario.title);
    println!();
    println!("{}", scenario.story.trim());
    println!();
    println!("Risk: {}", scenario.risk_statement);
    println!("Objective: {}", scenario.governance_objective);
}

fn print_status(session: &GameSession<FileStorage>) {
    let state = session.state();
    println!("Status: {}", state.status);

    match state.status {
        GameStatus::Idle => println!("No game in progress. Run 'escape-room session start'."),
        GameStatus::Results => println!(
            "All {} scenarios submitted. Run 'escape-room session report'.",
            session.total_scenarios()
        ),
        GameStatus::Playing | GameStatus::ScenarioComplete => {
            println!(
                "Scenario {}/{}",
                session.current_scenario_number(),
                session.total_scenarios()
            );
            if let Some(scenario) = &state.current_scenario {
                println!();
                print_scenario(scenario);
            }
            println!();
            print_selection(session);
            println!("Hints remaining: {}", session.hints_remaining());
        }
    }
}

fn print_selection(session: &GameSession<FileStorage>) {
    let selected = &session.state().selected_control_ids;
    if selected.is_empty() {
        println!("Selected: (none)");
        return;
    }
    println!("Selected:");
    for id in selected {
        let name = session
            .content()
            .control(id)
            .map_or(id.as_str(), |c| c.name.as_str());
        println!("  - {name} ({id})");
    }
}
