//! Startup sequencing
//!
//! Each bring-up step reports its result through [`StartupSequence::complete`].
//! The first failure is logged once and aborts startup; there is no retry and
//! no degraded mode.

use core::fmt;

/// Bring-up steps, in the order the firmware performs them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStage {
    /// Radio and BLE controller
    Transport,
    /// UART peripheral
    ByteSource,
    /// GATT server with the bridge service
    Service,
    /// First advertising start
    Advertising,
}

impl StartupStage {
    fn bit(self) -> u8 {
        match self {
            StartupStage::Transport => 1 << 0,
            StartupStage::ByteSource => 1 << 1,
            StartupStage::Service => 1 << 2,
            StartupStage::Advertising => 1 << 3,
        }
    }
}

/// Fatal startup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    /// Radio or BLE controller failed to initialise
    TransportInit,
    /// UART could not be configured
    ByteSourceNotReady,
    /// GATT server could not be built
    ServiceRegistration,
    /// Advertising failed to start
    Advertising,
}

impl From<StartupStage> for StartupError {
    fn from(stage: StartupStage) -> Self {
        match stage {
            StartupStage::Transport => StartupError::TransportInit,
            StartupStage::ByteSource => StartupError::ByteSourceNotReady,
            StartupStage::Service => StartupError::ServiceRegistration,
            StartupStage::Advertising => StartupError::Advertising,
        }
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            StartupError::TransportInit => "Bluetooth init failed",
            StartupError::ByteSourceNotReady => "UART device not ready",
            StartupError::ServiceRegistration => "bridge service registration failed",
            StartupError::Advertising => "advertising failed to start",
        };
        f.write_str(msg)
    }
}

/// Failure inside the transport stage, which spans two driver calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportInitError<R, C> {
    /// Radio controller could not be started
    Radio(R),
    /// BLE connector could not be created on top of the radio
    Connector(C),
}

/// Record of the completed bring-up steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartupSequence {
    completed: u8,
    failed: Option<StartupError>,
}

impl StartupSequence {
    pub const fn new() -> Self {
        Self {
            completed: 0,
            failed: None,
        }
    }

    /// Record the outcome of `stage`
    ///
    /// On failure the diagnostic is logged and the error returned; the caller
    /// must stop bringing the device up.
    pub fn complete<T, E: fmt::Debug>(
        &mut self,
        stage: StartupStage,
        result: Result<T, E>,
    ) -> Result<T, StartupError> {
        match result {
            Ok(value) => {
                self.completed |= stage.bit();
                log::info!("Startup: {:?} ready", stage);
                Ok(value)
            }
            Err(e) => {
                let error = StartupError::from(stage);
                self.failed = Some(error);
                log::error!(
                    "Startup: {} ({:?}), application will be terminated",
                    error,
                    e
                );
                Err(error)
            }
        }
    }

    pub fn is_complete(&self, stage: StartupStage) -> bool {
        self.completed & stage.bit() != 0
    }

    /// Returns true once a peer can find the device
    pub fn is_discoverable(&self) -> bool {
        self.is_complete(StartupStage::Advertising)
    }

    /// The error that aborted startup, if any
    pub fn failure(&self) -> Option<StartupError> {
        self.failed
    }
}
