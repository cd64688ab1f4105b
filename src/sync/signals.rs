// Signal handling for the polling loop

use crate::error::{Result, SyncError};
use tokio::signal::unix::{signal, Signal, SignalKind};

/// What a received signal asks the loop to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSignal {
    /// SIGTERM, SIGINT or SIGHUP
    Stop(&'static str),
    /// SIGUSR1
    SyncNow,
}

/// Listens for the signals the polling loop reacts to
pub struct SignalHandler {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
    sigusr1: Signal,
}

impl SignalHandler {
    pub fn new() -> Result<Self> {
        let install = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| SyncError::Io {
                source: e,
                context: format!("Failed to setup {} handler", name),
            })
        };

        Ok(Self {
            sigterm: install(SignalKind::terminate(), "SIGTERM")?,
            sigint: install(SignalKind::interrupt(), "SIGINT")?,
            sighup: install(SignalKind::hangup(), "SIGHUP")?,
            sigusr1: install(SignalKind::user_defined1(), "SIGUSR1")?,
        })
    }

    /// Wait for the next signal
    pub async fn wait(&mut self) -> LoopSignal {
        let signal = tokio::select! {
            _ = self.sigterm.recv() => LoopSignal::Stop("SIGTERM"),
            _ = self.sigint.recv() => LoopSignal::Stop("SIGINT"),
            _ = self.sighup.recv() => LoopSignal::Stop("SIGHUP"),
            _ = self.sigusr1.recv() => LoopSignal::SyncNow,
        };
        tracing::debug!(?signal, "Received signal");
        signal
    }
}
