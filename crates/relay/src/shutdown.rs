//! Cooperative shutdown
//!
//! A single stop flag shared between the signal listener and the relay loop.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cloneable stop flag
///
/// Every clone observes the same flag. Triggering is idempotent.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the relay to stop
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the flag is set
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}

/// Trigger `handle` on SIGINT (Ctrl+C) or SIGTERM
///
/// The listener task ends once the handle is triggered by any party.
///
/// # Errors
/// Fails if the SIGTERM handler cannot be installed.
pub fn listen_for_signals(handle: ShutdownHandle) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    let mut sigterm =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            sigterm.recv().await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = interrupt => info!("Received interrupt signal, stopping relay"),
            _ = terminate => info!("Received terminate signal, stopping relay"),
            _ = handle.triggered() => return,
        }

        handle.trigger();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_clones_share_flag() {
        let handle = ShutdownHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_triggered());

        handle.trigger();
        assert!(clone.is_triggered());
        timeout(Duration::from_secs(1), clone.triggered())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_listener_exits_when_triggered_elsewhere() {
        let handle = ShutdownHandle::new();
        let listener = listen_for_signals(handle.clone()).unwrap();

        handle.trigger();
        timeout(Duration::from_secs(1), listener)
            .await
            .unwrap()
            .unwrap();
    }
}
