use crate::action_client::{HttpActionClient, Outcome};
use crate::config::ControllerConfig;
use crate::error::{RemoteError, Result};
use crate::protocol::{ActionRequest, Endpoint, HttpMethod};
use crate::subscription::{StatusReceiver, StatusUpdate};
use crate::types::{ControllerStatus, DeviceState, PowerState};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Number of command failures kept for diagnostics
const FAILURE_HISTORY: usize = 32;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Diagnostic record of a fire-and-forget command the receiver did not accept
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    pub operation_id: Uuid,
    pub endpoint: Endpoint,
    pub outcome: Outcome,
    pub at: SystemTime,
}

/// Handle to an in-flight fire-and-forget command
///
/// Dropping the handle does not cancel the request.
pub struct CommandHandle {
    id: Uuid,
    handle: JoinHandle<Outcome>,
}

impl CommandHandle {
    /// Get the operation ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the command to finish and return its outcome
    pub async fn outcome(self) -> Outcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::TransportError(format!("command task failed: {}", e)),
        }
    }
}

/// Everything the controller mutates, guarded by one lock
#[derive(Default)]
struct Shared {
    status: ControllerStatus,
    last_known: Option<DeviceState>,
    failures: VecDeque<CommandFailure>,
}

struct Inner {
    config: ControllerConfig,
    client: HttpActionClient,
    runtime: Handle,
    shared: Mutex<Shared>,
    update_tx: broadcast::Sender<StatusUpdate>,
}

/// Client-side cache of the receiver state
///
/// Queries ([`refresh`](Self::refresh), [`select_profile`](Self::select_profile))
/// drive [`ControllerStatus`]. Commands (volume, subwoofer, power) are fire-and-forget:
/// their failures are logged and recorded in [`recent_failures`](Self::recent_failures)
/// but never change the status or the cached state.
///
/// The handle is cheap to clone; all clones share the same cache.
///
/// # Example
///
/// ```no_run
/// use receiver_remote::{ControllerConfig, DeviceStateController};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ControllerConfig::new("http://10.205.0.5:8001")?;
///     let controller = DeviceStateController::new(config)?;
///
///     let mut updates = controller.subscribe();
///     controller.select_profile("vinyl").await;
///     controller.set_volume(20);
///
///     while let Ok(update) = updates.recv().await {
///         println!("Status: {:?}", update.status);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DeviceStateController {
    inner: Arc<Inner>,
}

impl DeviceStateController {
    /// Create a controller and start the initial refresh
    ///
    /// Must be called from within a tokio runtime; the runtime is kept to run
    /// commands issued later from any thread.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpActionClient::new(config.base_url.clone())?;
        Self::with_action_client(config, client)
    }

    /// Create a controller around an existing action client
    pub fn with_action_client(config: ControllerConfig, client: HttpActionClient) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| RemoteError::NoRuntime)?;
        let controller = Self::build(config, client, runtime);

        let initial = controller.clone();
        controller.inner.runtime.spawn(async move {
            initial.refresh().await;
        });

        Ok(controller)
    }

    fn build(config: ControllerConfig, client: HttpActionClient, runtime: Handle) -> Self {
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                client,
                runtime,
                shared: Mutex::new(Shared::default()),
                update_tx,
            }),
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.inner.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Get the current status
    pub fn status(&self) -> ControllerStatus {
        self.shared().status.clone()
    }

    /// Get the most recently decoded state, regardless of current status
    pub fn last_known_state(&self) -> Option<DeviceState> {
        self.shared().last_known.clone()
    }

    /// Get recent command failures, oldest first
    pub fn recent_failures(&self) -> Vec<CommandFailure> {
        self.shared().failures.iter().cloned().collect()
    }

    /// Subscribe to status updates
    ///
    /// The receiver starts from the status current at subscription time and
    /// sees every later update.
    pub fn subscribe(&self) -> StatusReceiver {
        let shared = self.shared();
        StatusReceiver::new(self.inner.update_tx.subscribe(), shared.status.clone())
    }

    /// Fetch the full receiver state
    pub async fn refresh(&self) -> ControllerStatus {
        let request = ActionRequest::new(self.inner.config.state_endpoint.endpoint(), HttpMethod::Get)
            .expecting_body()
            .with_timeout(Some(self.inner.config.query_timeout));
        self.query(request).await
    }

    /// Switch the active profile
    ///
    /// The receiver answers with the full updated state, so this doubles as a refresh.
    pub async fn select_profile(&self, name: &str) -> ControllerStatus {
        let request = ActionRequest::new(Endpoint::Profile, HttpMethod::Put)
            .with_param("name", name)
            .expecting_body()
            .with_timeout(Some(self.inner.config.query_timeout));
        self.query(request).await
    }

    /// Set the absolute volume level
    pub fn set_volume(&self, level: i32) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::Volume, HttpMethod::Put).with_param("level", level))
    }

    /// Set the absolute subwoofer level
    pub fn set_subwoofer_level(&self, level: i32) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::Subwoofer, HttpMethod::Put).with_param("level", level))
    }

    /// Step the volume up one unit
    pub fn volume_up(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::VolumeUp, HttpMethod::Put))
    }

    /// Step the volume down one unit
    pub fn volume_down(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::VolumeDown, HttpMethod::Put))
    }

    /// Step the subwoofer level up one unit
    pub fn subwoofer_up(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::SubwooferUp, HttpMethod::Put))
    }

    /// Step the subwoofer level down one unit
    pub fn subwoofer_down(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::SubwooferDown, HttpMethod::Put))
    }

    /// Power the receiver on
    pub fn power_on(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::PowerOn, HttpMethod::Put))
    }

    /// Put the receiver into standby
    pub fn power_off(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::PowerOff, HttpMethod::Put))
    }

    /// Toggle the receiver between on and standby
    pub fn power_toggle(&self) -> CommandHandle {
        self.command(ActionRequest::new(Endpoint::PowerSwitch, HttpMethod::Put))
    }

    /// Ask the receiver whether it is powered on
    ///
    /// Uses the query deadline but leaves [`ControllerStatus`] untouched;
    /// failures come back as the classified [`Outcome`].
    pub async fn power_status(&self) -> std::result::Result<PowerState, Outcome> {
        let request = ActionRequest::new(Endpoint::Power, HttpMethod::Get)
            .expecting_body()
            .with_timeout(Some(self.inner.config.query_timeout));

        let result = self.inner.client.fetch::<PowerState>(&request).await;
        if let Err(outcome) = &result {
            tracing::warn!(
                id = %request.id,
                endpoint = %request.endpoint,
                outcome = outcome.label(),
                "Power status query failed: {}",
                outcome
            );
        }
        result
    }

    async fn query(&self, request: ActionRequest) -> ControllerStatus {
        let outcome = self.inner.client.perform(&request).await;
        self.apply_query_outcome(request.id, request.endpoint, outcome)
    }

    fn command(&self, request: ActionRequest) -> CommandHandle {
        let request = request.with_timeout(self.inner.config.command_timeout);
        let id = request.id;
        let controller = self.clone();

        let handle = self.inner.runtime.spawn(async move {
            let outcome = controller.inner.client.perform(&request).await;
            if !outcome.is_success() {
                controller.record_failure(&request, &outcome);
            }
            outcome
        });

        CommandHandle { id, handle }
    }

    /// Fold a query outcome into the status and notify subscribers
    fn apply_query_outcome(&self, operation_id: Uuid, endpoint: Endpoint, outcome: Outcome) -> ControllerStatus {
        let status = match outcome {
            Outcome::Decoded(state) => ControllerStatus::Loaded(state),
            Outcome::TimedOut => ControllerStatus::TimedOut,
            other => {
                tracing::warn!(id = %operation_id, %endpoint, "Receiver query failed: {}", other);
                ControllerStatus::FetchFailed
            }
        };

        let mut shared = self.shared();
        if shared.status.label() != status.label() {
            tracing::info!(
                id = %operation_id,
                %endpoint,
                from = shared.status.label(),
                to = status.label(),
                "Controller status changed"
            );
        }
        if let ControllerStatus::Loaded(state) = &status {
            shared.last_known = Some(state.clone());
        }
        shared.status = status.clone();

        // Sent under the lock so updates reach subscribers in mutation order
        let _ = self.inner.update_tx.send(StatusUpdate {
            operation_id,
            endpoint,
            status: status.clone(),
        });

        status
    }

    fn record_failure(&self, request: &ActionRequest, outcome: &Outcome) {
        tracing::warn!(
            id = %request.id,
            endpoint = %request.endpoint,
            query = ?request.query,
            outcome = outcome.label(),
            "Dropping failed receiver command: {}",
            outcome
        );

        let mut shared = self.shared();
        if shared.failures.len() == FAILURE_HISTORY {
            shared.failures.pop_front();
        }
        shared.failures.push_back(CommandFailure {
            operation_id: request.id,
            endpoint: request.endpoint,
            outcome: outcome.clone(),
            at: SystemTime::now(),
        });
    }
}
