//! # Mileage Console
//!
//! Interactive front-end for the telemetry backend. Reads one command per
//! line from stdin, drives a `SyncEngine` and prints state and toasts.
//! Leaves on `quit`, end of input or Ctrl-C, shutting the engine down so no
//! poll or pending publish request outlives the session.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

use lib_sync::loggers::setup_logging;
use lib_sync::{HttpFleetGateway, SyncEngine};

mod console_logic;
use console_logic::commands::{Command, HELP, ParseError};
use console_logic::{config, render, until_interrupted};

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = config::load_config()?;
    let settings = loaded.settings;
    let _guard = setup_logging(&settings.log_dir, &settings.log_level, "mileage_console")?;
    match &loaded.source_file {
        Some(path) => info!(config = %path.display(), "configuration file loaded"),
        None => info!("no configuration file, using defaults and environment"),
    }
    info!("{settings}");

    let gateway = HttpFleetGateway::connect(&settings.base_url, &settings.api_client_options())?;
    let engine = SyncEngine::with_options(
        Arc::new(gateway),
        Arc::new(render::ConsoleSink),
        settings.engine_options(),
    );

    let count = engine.activate().await;
    println!("Connected to {} ({count} vehicles). Type 'help' for commands.", settings.base_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!();
                info!("Ctrl-C received, leaving console.");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if until_interrupted(run_command(&engine, command), signal::ctrl_c()).await.is_none() {
                            println!();
                            info!("Ctrl-C received during a command, leaving console.");
                            break;
                        }
                    }
                    Err(ParseError::Empty) => {}
                    Err(e) => println!("{}", render::failure(&e.to_string())),
                }
            }
        }
    }

    engine.shutdown().await;
    info!("Shutdown complete.");
    Ok(())
}

fn prompt() {
    print!("mileage> ");
    let _ = std::io::stdout().flush();
}

async fn run_command(engine: &SyncEngine, command: Command) {
    match command {
        Command::Vehicles => {
            engine.load_vehicles().await;
            println!("{}", render::vehicles(&engine.snapshot()));
        }
        Command::Users => println!("{}", render::users(&engine.snapshot())),
        Command::Vehicle(id) => {
            engine.select_vehicle(id).await;
            println!("{}", render::users(&engine.snapshot()));
        }
        Command::User(id) => match engine.select_user(id) {
            Ok(fetch) => {
                fetch.await;
                println!("{}", render::snapshot(&engine.snapshot()));
            }
            Err(e) => println!("{}", render::failure(&e.to_string())),
        },
        Command::Mileage(value) => match engine.set_mileage_input(value) {
            Ok(()) => println!("{}", render::success(&format!("mileage input set to {value}"))),
            Err(e) => println!("{}", render::failure(&e.to_string())),
        },
        Command::Target(value) => match engine.update_efficiency_target(value) {
            Ok(update) => {
                if update.await {
                    let stored = engine.snapshot().efficiency_target;
                    let text = format!("efficiency target is now {}", stored.unwrap_or(value));
                    println!("{}", render::success(&text));
                } else {
                    println!("{}", render::failure("efficiency target was not updated, see log"));
                }
            }
            Err(e) => println!("{}", render::failure(&e.to_string())),
        },
        Command::Average => match engine.refresh_average_mileage() {
            Ok(refresh) => {
                refresh.await;
                println!("{}", render::snapshot(&engine.snapshot()));
            }
            Err(e) => println!("{}", render::failure(&e.to_string())),
        },
        Command::Publish => match engine.publish() {
            Ok(burst) => {
                let reading = burst.reading().clone();
                println!(
                    "{}",
                    render::success(&format!(
                        "publishing {} for {}/{} ({} requests)",
                        reading.value,
                        reading.vehicle_id,
                        reading.user_id,
                        burst.len()
                    ))
                );
                tokio::spawn(async move {
                    let outcomes = burst.join().await;
                    println!("\n{}", render::publish_summary(&outcomes));
                });
            }
            Err(e) => println!("{}", render::failure(&e.to_string())),
        },
        Command::Show => println!("{}", render::snapshot(&engine.snapshot())),
        Command::Help => println!("{HELP}"),
        Command::Quit => warn!("quit is handled by the input loop"),
    }
}
