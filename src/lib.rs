//! Rust library for remote-controlling a networked audio receiver
//!
//! The receiver exposes a small JSON/HTTP API (active input profile, volume,
//! subwoofer level, power). This library keeps a local cached view of that
//! state in sync with the receiver over unreliable networks:
//!
//! - State queries with a bounded deadline (`refresh`, `select_profile`)
//! - Fire-and-forget commands for continuous inputs (volume, subwoofer, power)
//! - Status publication to any number of subscribers
//! - Distinct reporting of unreachable receivers vs. other failures
//!
//! # Quick Start
//!
//! ```no_run
//! use receiver_remote::{ControllerConfig, ControllerStatus, DeviceStateController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ControllerConfig::new("http://10.205.0.5:8001")?;
//!
//!     // Construction fires the initial refresh in the background
//!     let controller = DeviceStateController::new(config)?;
//!
//!     match controller.refresh().await {
//!         ControllerStatus::Loaded(state) => {
//!             println!("{} at {}/{}", state.profile, state.volume_level, state.max_volume);
//!             controller.set_volume(state.volume_level + 1);
//!         }
//!         ControllerStatus::TimedOut => println!("Receiver unreachable"),
//!         other => println!("Status: {:?}", other),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Controller**: status cache, query/command sequencing, notifications
//! - **Action client**: one HTTP request per call, outcome classification
//! - **Protocol**: endpoints and request structures
//! - **Subscription**: status update receivers
//! - **Types**: domain types and data structures

mod action_client;
mod config;
mod controller;
mod error;
mod protocol;
mod subscription;
mod types;

// Public exports
pub use action_client::{HttpActionClient, Outcome};
pub use config::{
    ControllerConfig, DEFAULT_QUERY_TIMEOUT, ENV_BASE_URL, ENV_COMMAND_TIMEOUT_MS,
    ENV_QUERY_TIMEOUT_MS, ENV_STATE_ENDPOINT,
};
pub use controller::{CommandFailure, CommandHandle, DeviceStateController};
pub use error::{RemoteError, Result};
pub use protocol::{ActionRequest, Endpoint, HttpMethod, StateEndpoint};
pub use subscription::{StatusReceiver, StatusUpdate};
pub use types::{
    ControllerStatus, DeviceState, PowerState, KNOWN_PROFILES, PROFILE_DJ, PROFILE_SPOTIFY, PROFILE_TV,
    PROFILE_VINYL,
};
