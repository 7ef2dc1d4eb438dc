use crate::error::{RemoteError, Result};
use crate::protocol::Endpoint;
use crate::types::ControllerStatus;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Status change published by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// Operation whose own response produced this status
    pub operation_id: Uuid,

    /// Endpoint that operation queried
    pub endpoint: Endpoint,

    /// New controller status
    pub status: ControllerStatus,
}

/// Receiver for status updates
///
/// Dropping the receiver unsubscribes it.
pub struct StatusReceiver {
    rx: broadcast::Receiver<StatusUpdate>,
    current: ControllerStatus,
}

impl StatusReceiver {
    /// Create a new status receiver starting from `current`
    pub(crate) fn new(rx: broadcast::Receiver<StatusUpdate>, current: ControllerStatus) -> Self {
        Self { rx, current }
    }

    /// Latest status this receiver has seen
    pub fn current(&self) -> &ControllerStatus {
        &self.current
    }

    /// Receive the next status update
    ///
    /// Returns an error once the controller has been dropped.
    pub async fn recv(&mut self) -> Result<StatusUpdate> {
        let update = self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => RemoteError::ConnectionClosed,
            broadcast::error::RecvError::Lagged(n) => {
                RemoteError::ChannelError(format!("Lagged by {} updates", n))
            }
        })?;
        self.current = update.status.clone();
        Ok(update)
    }

    /// Try to receive a status update without blocking
    ///
    /// Returns `None` if no update is available.
    pub fn try_recv(&mut self) -> Result<Option<StatusUpdate>> {
        match self.rx.try_recv() {
            Ok(update) => {
                self.current = update.status.clone();
                Ok(Some(update))
            }
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(RemoteError::ConnectionClosed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                Err(RemoteError::ChannelError(format!("Lagged by {} updates", n)))
            }
        }
    }
}
