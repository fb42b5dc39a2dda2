mod cli;

use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use radoff_core::{Coordinator, CoreError, PollState, PollerConfig, Snapshot};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CoreError> {
    let config = PollerConfig {
        username: cli.username,
        password: SecretString::from(cli.password),
        client_id: cli.client_id,
        pool_id: cli.pool_id,
        pool_region: cli.pool_region,
        poll_interval_secs: cli.interval,
    };

    let coordinator = Coordinator::new(config)?;

    if cli.watch {
        watch(&coordinator).await
    } else {
        // One-shot: a single refresh, print, done.
        coordinator.refresh().await?;
        if let Some(snapshot) = coordinator.snapshot() {
            print_snapshot(&snapshot);
        }
        Ok(())
    }
}

/// Poll on the configured interval until Ctrl-C, printing every new
/// snapshot and reporting failed cycles without exiting.
async fn watch(coordinator: &Coordinator) -> Result<(), CoreError> {
    coordinator.start().await?;
    if let Some(snapshot) = coordinator.snapshot() {
        print_snapshot(&snapshot);
    }

    let mut state = coordinator.state();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                match current {
                    PollState::Ready => {
                        if let Some(snapshot) = coordinator.snapshot() {
                            print_snapshot(&snapshot);
                        }
                    }
                    PollState::Failed { message } => {
                        eprintln!("poll failed (keeping last readings): {message}");
                    }
                    PollState::Uninitialized => {}
                }
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}

fn print_snapshot(snapshot: &Snapshot) {
    println!(
        "[{}] {} device(s) via {}",
        snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.devices.len(),
        snapshot.source_label,
    );
    for device in &snapshot.devices {
        println!("  {} ({} {})", device.name, device.device_type, device.device_serial);
        let mut keys: Vec<&String> = device.sensors.keys().collect();
        keys.sort();
        for key in keys {
            let sensor = &device.sensors[key];
            match sensor.unit {
                Some(unit) => println!("    {:<12} {} {}", sensor.label, sensor.value(), unit),
                None => println!("    {:<12} {}", sensor.label, sensor.value()),
            }
        }
    }
}
