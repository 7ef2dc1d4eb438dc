//! Console remote for a networked receiver
//!
//! ```text
//! RECEIVER_BASE_URL=http://10.205.0.5:8001 cargo run --example remote
//! ```
//!
//! Commands: `profile <name>`, `vol <level>`, `vol+`, `vol-`, `sub <level>`,
//! `sub+`, `sub-`, `on`, `off`, `toggle`, `power`, `refresh`, `failures`, `quit`.

use receiver_remote::{ControllerConfig, ControllerStatus, DeviceStateController, KNOWN_PROFILES};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn describe(status: &ControllerStatus) -> String {
    match status {
        ControllerStatus::Uninitialized => "waiting for receiver...".to_string(),
        ControllerStatus::Loaded(state) => format!(
            "{:<8} volume {:>3}/{:<3} ({:>3.0}%)  sub {:+}",
            state.profile,
            state.volume_level,
            state.max_volume,
            state.volume_fraction() * 100.0,
            state.subwoofer_level
        ),
        ControllerStatus::FetchFailed => "receiver returned an error".to_string(),
        ControllerStatus::TimedOut => "receiver unreachable".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = ControllerConfig::from_env()?;
    println!("Connecting to {}", config.base_url);
    println!("Profiles: {}", KNOWN_PROFILES.join(", "));

    let controller = DeviceStateController::new(config)?;

    let mut updates = controller.subscribe();
    tokio::spawn(async move {
        while let Ok(update) = updates.recv().await {
            println!("[{}] {}", update.endpoint, describe(&update.status));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        match (command, arg) {
            ("profile", Some(name)) => {
                controller.select_profile(name).await;
            }
            ("refresh", _) => {
                controller.refresh().await;
            }
            ("vol", Some(level)) => match level.parse() {
                Ok(level) => {
                    controller.set_volume(level);
                }
                Err(_) => println!("invalid level '{}'", level),
            },
            ("sub", Some(level)) => match level.parse() {
                Ok(level) => {
                    controller.set_subwoofer_level(level);
                }
                Err(_) => println!("invalid level '{}'", level),
            },
            ("vol+", _) => {
                controller.volume_up();
            }
            ("vol-", _) => {
                controller.volume_down();
            }
            ("sub+", _) => {
                controller.subwoofer_up();
            }
            ("sub-", _) => {
                controller.subwoofer_down();
            }
            ("on", _) => {
                controller.power_on();
            }
            ("off", _) => {
                controller.power_off();
            }
            ("toggle", _) => {
                controller.power_toggle();
            }
            ("power", _) => match controller.power_status().await {
                Ok(power) => println!("powered: {}", power.is_powered),
                Err(outcome) => println!("power query failed: {}", outcome),
            },
            ("failures", _) => {
                for failure in controller.recent_failures() {
                    println!("{} {} {}", failure.operation_id, failure.endpoint, failure.outcome);
                }
            }
            ("quit", _) | ("exit", _) => break,
            _ => println!("unknown command: {}", line.trim()),
        }
    }

    Ok(())
}
