use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use chatline::application::errors::{ClientError, ConfigError};
use chatline::application::messaging::InputParser;
use chatline::application::services::{ChatClient, Flow, InputGate};
use chatline::domain::traits::{ChatView, ConnectionEvent};
use chatline::infrastructure::adapters::console::{
    spawn_line_reader, spawn_raw_reader, ConsoleView, EditOutcome, LineEditor, RawLineWriter,
    RawModeGuard, TerminalInput,
};
use chatline::infrastructure::adapters::websocket::{ConnectionSupervisor, WsConnector};
use chatline::infrastructure::config::Config;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Parser)]
#[command(name = "chatline")]
#[command(about = "Terminal client for WebSocket chat servers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "chatline.yaml", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and chat
    Run {
        /// Server URL (overrides config)
        #[arg(short, long)]
        url: Option<String>,

        /// Join with this username once connected
        #[arg(short = 'n', long)]
        username: Option<String>,
    },
    /// Show version
    Version,
    /// Write the default config
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { url, username } => load_config(&cli.config, url, username).and_then(|config| {
            let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
            init_logging(&config.logging.level, interactive);
            run_chat(config, interactive)
        }),
        Commands::Version => {
            println!("chatline v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig { force } => {
            init_logging("info", false);
            init_config(&cli.config, force)
        }
    };

    if let Err(e) = result {
        eprintln!("chatline: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(default_level: &str, raw_terminal: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stderr shares the screen with the prompt while raw mode is on
    let writer = if raw_terminal {
        BoxMakeWriter::new(RawLineWriter::stderr)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(writer)
        .with_env_filter(filter)
        .init();
}

/// File, then environment, then command line
fn load_config(
    path: &str,
    url: Option<String>,
    username: Option<String>,
) -> Result<Config, ClientError> {
    let mut config = Config::load_or_default(path)?;
    config.apply_env();
    config.apply_overrides(url, username);
    config.validate()?;
    Ok(config)
}

fn init_config(path: &str, force: bool) -> Result<(), ClientError> {
    if Path::new(path).exists() && !force {
        return Err(ConfigError::InvalidValue(format!(
            "{} already exists (use --force to overwrite)",
            path
        ))
        .into());
    }

    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml).map_err(ConfigError::from)?;
    tracing::info!("Wrote default config to {}", path);
    Ok(())
}

fn run_chat(config: Config, interactive: bool) -> Result<(), ClientError> {
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(chat_loop(config, interactive));
    // The stdin reader may be parked in a blocking read
    rt.shutdown_background();
    result
}

async fn chat_loop(config: Config, interactive: bool) -> Result<(), ClientError> {
    let _raw_mode = if interactive {
        Some(RawModeGuard::enable()?)
    } else {
        None
    };

    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    if interactive {
        spawn_raw_reader(input_tx);
    } else {
        spawn_line_reader(input_tx);
    }

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let supervisor = ConnectionSupervisor::new(WsConnector, config.server.url.clone())
        .with_reconnect_delay(config.reconnect_delay());
    let connection = tokio::spawn(supervisor.run(outbound_rx, events_tx));

    let view = ConsoleView::stdout(config.display.format, interactive)
        .with_timestamps(config.display.timestamps);
    let mut client = ChatClient::new(view, outbound_tx)
        .with_typing_timeout(config.typing_timeout())
        .with_parser(InputParser::new(config.client.command_prefix.clone()));

    client.view_mut().show_system(&format!(
        "Connecting to {}. Type {}help for commands.",
        config.server.url, config.client.command_prefix
    ));

    let mut auto_join = config.client.username.clone();
    let mut editor = LineEditor::new();
    // Piped lines wait for the connection and the join
    let mut gate = InputGate::new(!interactive);
    let mut input_open = true;

    loop {
        let deadline = client.typing_deadline();

        tokio::select! {
            event = events_rx.recv() => {
                let Some(event) = event else {
                    tracing::error!("Connection task stopped");
                    break;
                };
                let opened = event == ConnectionEvent::Opened;
                client.handle_event(event);
                if opened {
                    if let Some(name) = auto_join.take() {
                        client.join(&name);
                    }
                }
                if gate.pump(&mut client) == Flow::Quit {
                    break;
                }
            }
            input = input_rx.recv(), if input_open => {
                let Some(input) = input else {
                    if interactive {
                        break;
                    }
                    input_open = false;
                    gate.close();
                    if gate.pump(&mut client) == Flow::Quit {
                        break;
                    }
                    continue;
                };
                let is_key = matches!(
                    input,
                    TerminalInput::Char(_) | TerminalInput::Backspace | TerminalInput::Enter | TerminalInput::ClearLine
                );
                if is_key && client.view_mut().dismiss_alert() {
                    continue;
                }
                match editor.apply(input) {
                    EditOutcome::Edited => {
                        client.on_keystroke(Instant::now());
                        client.view_mut().set_input(editor.buffer());
                    }
                    EditOutcome::Submitted(line) => {
                        client.view_mut().set_input("");
                        gate.push(line);
                        if gate.pump(&mut client) == Flow::Quit {
                            break;
                        }
                    }
                    EditOutcome::Interrupted if interactive => break,
                    // End of piped input
                    EditOutcome::Interrupted => {
                        input_open = false;
                        gate.close();
                        if gate.pump(&mut client) == Flow::Quit {
                            break;
                        }
                    }
                    EditOutcome::Unchanged => {}
                }
            }
            _ = typing_deadline(deadline) => {
                client.on_typing_deadline(Instant::now());
            }
        }
    }

    client.view_mut().finish();
    drop(client);

    // Dropping the client closed the outbound channel; the connection task
    // writes what is still queued, then closes the socket
    if tokio::time::timeout(SHUTDOWN_GRACE, connection).await.is_err() {
        tracing::debug!("Connection task did not stop in time");
    }
    Ok(())
}

async fn typing_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
