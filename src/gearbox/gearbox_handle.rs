//! Gearbox Handle - Unified API for the gear/speed simulation
//!
//! Spawns the tick-loop worker on the tokio runtime and exposes the two
//! channels the rest of the application talks to: a command sender for input
//! events and a watch receiver carrying the latest [`ControllerState`].
//!

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::GearboxConfig;
use crate::input::keyboard::{action_for_key, command_for, KeyTransition};

pub use super::gear::GearPosition;
pub use super::speed_controller::{ControllerState, GearSpeedController, GearboxObserver};
pub use super::worker::{run_gearbox_loop, GearboxCommand, GearboxWorker};

/// Timing settings for the gearbox worker
///
/// # Examples
///
/// ```rust,ignore
/// // A snappier simulation with a shorter warning
/// let settings = GearboxSettings {
///     tick_interval_ms: 50,
///     clutch_warning_ms: 1000,
///     command_buffer: 100,
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GearboxSettings {
    /// Period of the speed tick in milliseconds
    ///
    /// Every tick moves speed by one step (two while braking), so this also
    /// sets how fast the car accelerates in wall-clock time.
    pub tick_interval_ms: u64,

    /// How long the clutch warning stays up after a rejected shift
    pub clutch_warning_ms: u64,

    /// Capacity of the command channel between input and worker
    pub command_buffer: usize,
}

impl Default for GearboxSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            clutch_warning_ms: 1500,
            command_buffer: 100,
        }
    }
}

impl GearboxSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn clutch_warning_window(&self) -> Duration {
        Duration::from_millis(self.clutch_warning_ms)
    }

    pub fn validate(&self) -> Result<(), GearboxError> {
        if self.tick_interval_ms == 0 {
            return Err(GearboxError::InvalidSettings(
                "tick interval must be greater than zero".to_string(),
            ));
        }
        if self.clutch_warning_ms == 0 {
            return Err(GearboxError::InvalidSettings(
                "clutch warning window must be greater than zero".to_string(),
            ));
        }
        if self.command_buffer == 0 {
            return Err(GearboxError::InvalidSettings(
                "command buffer must hold at least one command".to_string(),
            ));
        }
        Ok(())
    }
}

impl From<&GearboxConfig> for GearboxSettings {
    fn from(config: &GearboxConfig) -> Self {
        Self {
            tick_interval_ms: config.tick_interval_ms,
            clutch_warning_ms: config.clutch_warning_ms,
            command_buffer: config.command_buffer,
        }
    }
}

/// Errors raised by the gearbox runtime
///
/// Rejected shifts and unknown keys are modeled behavior, not errors; these
/// variants only cover the plumbing around the state machine.
#[derive(Debug, thiserror::Error)]
pub enum GearboxError {
    /// Settings that would stall or break the tick loop
    #[error("Invalid gearbox settings: {0}")]
    InvalidSettings(String),

    /// The command buffer is full; the input event was dropped
    #[error("Command channel full, dropped {0:?}")]
    ChannelFull(GearboxCommand),

    /// The worker is gone
    #[error("Command channel closed, dropped {0:?}")]
    ChannelClosed(GearboxCommand),

    #[error("Gearbox worker failed: {0}")]
    WorkerFailed(#[from] tokio::task::JoinError),
}

/// Handle owning the command side of a running gearbox worker
///
/// Dropping the handle closes the command channel and stops the worker. The
/// snapshot side can be subscribed to any number of times.
pub struct GearboxHandle {
    command_sender: mpsc::Sender<GearboxCommand>,
    state_receiver: watch::Receiver<ControllerState>,
    worker_task: JoinHandle<()>,
}

impl GearboxHandle {
    /// Spawns the gearbox worker on the current tokio runtime
    ///
    /// # Arguments
    ///
    /// * `settings` - Optional timing settings; uses defaults if None
    /// * `observers` - Notification sinks for gear changes and clutch warnings
    ///
    /// # Errors
    ///
    /// Returns [`GearboxError::InvalidSettings`] if the settings fail validation.
    pub fn spawn(
        settings: Option<GearboxSettings>,
        observers: Vec<Box<dyn GearboxObserver>>,
    ) -> Result<Self, GearboxError> {
        info!("Initializing Gearbox with settings: {:?}", settings);

        let settings = settings.unwrap_or_default();
        settings.validate()?;

        let mut controller = GearSpeedController::new(settings.clutch_warning_window());
        let observer_count = observers.len();
        for observer in observers {
            controller.add_observer(observer);
        }
        debug!("Registered {} gearbox observers", observer_count);

        let (command_sender, command_receiver) = mpsc::channel(settings.command_buffer);
        debug!(
            "Created command channel with buffer capacity {}",
            settings.command_buffer
        );

        let worker = GearboxWorker::create(command_receiver, settings, controller);
        let state_receiver = worker.subscribe();

        info!("Spawning Gearbox Worker task");
        let worker_task = tokio::spawn(async move {
            info!("Gearbox Worker task started");
            run_gearbox_loop(worker).await;
        });

        info!("Gearbox initialized successfully");
        Ok(Self {
            command_sender,
            state_receiver,
            worker_task,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        debug!("New subscriber to gearbox state");
        self.state_receiver.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> ControllerState {
        *self.state_receiver.borrow()
    }

    /// Queues a command without waiting; safe to call from the UI thread
    pub fn dispatch(&self, command: GearboxCommand) -> Result<(), GearboxError> {
        self.command_sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(command) => GearboxError::ChannelFull(command),
            mpsc::error::TrySendError::Closed(command) => GearboxError::ChannelClosed(command),
        })
    }

    pub fn request_gear_change(&self, target: GearPosition) -> Result<(), GearboxError> {
        self.dispatch(GearboxCommand::RequestGear(target))
    }

    pub fn set_accelerator_pressed(&self, pressed: bool) -> Result<(), GearboxError> {
        self.dispatch(GearboxCommand::SetAccelerator(pressed))
    }

    pub fn set_brake_pressed(&self, pressed: bool) -> Result<(), GearboxError> {
        self.dispatch(GearboxCommand::SetBrake(pressed))
    }

    pub fn set_clutch_pressed(&self, pressed: bool) -> Result<(), GearboxError> {
        self.dispatch(GearboxCommand::SetClutch(pressed))
    }

    /// Feeds a key-down event; unrecognized keys are ignored
    pub fn key_down(&self, key: &str) -> Result<(), GearboxError> {
        self.key_event(key, KeyTransition::Down)
    }

    /// Feeds a key-up event; unrecognized keys are ignored
    pub fn key_up(&self, key: &str) -> Result<(), GearboxError> {
        self.key_event(key, KeyTransition::Up)
    }

    fn key_event(&self, key: &str, transition: KeyTransition) -> Result<(), GearboxError> {
        let Some(action) = action_for_key(key) else {
            debug!("Ignoring unrecognized key {:?}", key);
            return Ok(());
        };
        match command_for(action, transition) {
            Some(command) => self.dispatch(command),
            None => Ok(()),
        }
    }

    /// Closes the command channel and waits for the worker to finish
    pub async fn shutdown(self) -> Result<(), GearboxError> {
        info!("Shutting down gearbox worker");
        let Self {
            command_sender,
            worker_task,
            ..
        } = self;
        drop(command_sender);
        worker_task.await?;
        Ok(())
    }
}
