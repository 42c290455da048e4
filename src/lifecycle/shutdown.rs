//! Signal handling for graceful shutdown

use tokio::signal;
use tracing::debug;

/// Waits for Ctrl-C, or SIGTERM on unix
pub struct ShutdownSignal;

impl ShutdownSignal {
    pub fn new() -> Self {
        Self
    }

    /// Resolve once a shutdown signal arrives, returning its name
    pub async fn wait(&self) -> std::io::Result<&'static str> {
        #[cfg(unix)]
        {
            use signal::unix::SignalKind;

            let mut sigterm = signal::unix::signal(SignalKind::terminate())?;
            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    debug!("received SIGINT");
                    Ok("SIGINT")
                }
                _ = sigterm.recv() => {
                    debug!("received SIGTERM");
                    Ok("SIGTERM")
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await?;
            debug!("received Ctrl-C");
            Ok("Ctrl-C")
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
