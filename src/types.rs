use serde::{Deserialize, Serialize};

/// Profile name of the streaming input
pub const PROFILE_SPOTIFY: &str = "spotify";

/// Profile name of the television input
pub const PROFILE_TV: &str = "tv";

/// Profile name of the turntable input
pub const PROFILE_VINYL: &str = "vinyl";

/// Profile name of the DJ mixer input
pub const PROFILE_DJ: &str = "dj";

/// Profiles the stock receiver API ships with, in display order
///
/// The receiver may report any other name; this list is only a convenience
/// for building selection menus.
pub const KNOWN_PROFILES: [&str; 4] = [PROFILE_SPOTIFY, PROFILE_TV, PROFILE_VINYL, PROFILE_DJ];

/// Snapshot of the receiver state as reported by the receiver
///
/// Only ever produced by decoding a successful response body. A new snapshot
/// replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// Active input profile name
    pub profile: String,

    /// Current volume, expected within `0..=max_volume`
    pub volume_level: i32,

    /// Subwoofer level in receiver-defined units
    pub subwoofer_level: i32,

    /// Volume ceiling for the active profile
    pub max_volume: i32,
}

impl DeviceState {
    /// Check whether the reported volume lies within `0..=max_volume`
    ///
    /// The controller never enforces this; it is here for presentation layers
    /// that want to flag an out-of-range report.
    pub fn volume_in_range(&self) -> bool {
        self.max_volume >= 0 && (0..=self.max_volume).contains(&self.volume_level)
    }

    /// Volume as a fraction of `max_volume`, clamped to `0.0..=1.0`
    ///
    /// Returns `0.0` when the receiver reports a ceiling of zero.
    pub fn volume_fraction(&self) -> f64 {
        if self.max_volume <= 0 {
            return 0.0;
        }
        (f64::from(self.volume_level) / f64::from(self.max_volume)).clamp(0.0, 1.0)
    }
}

/// Power state as reported by `GET /power`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerState {
    pub is_powered: bool,
}

/// Controller status as seen by observers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControllerStatus {
    /// No query has completed yet
    #[default]
    Uninitialized,

    /// Last query decoded a state snapshot
    Loaded(DeviceState),

    /// Last query completed but failed (transport, status code or body)
    FetchFailed,

    /// Last query exceeded its deadline
    TimedOut,
}

impl ControllerStatus {
    /// Get the loaded state, if any
    pub fn device_state(&self) -> Option<&DeviceState> {
        match self {
            ControllerStatus::Loaded(state) => Some(state),
            _ => None,
        }
    }

    /// Check whether the receiver is considered unreachable
    pub fn is_offline(&self) -> bool {
        matches!(self, ControllerStatus::TimedOut)
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            ControllerStatus::Uninitialized => "uninitialized",
            ControllerStatus::Loaded(_) => "loaded",
            ControllerStatus::FetchFailed => "fetch_failed",
            ControllerStatus::TimedOut => "timed_out",
        }
    }
}
