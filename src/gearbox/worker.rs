use chrono::Local;
use statum::{machine, state};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, Interval};
use tracing::{debug, info};

use crate::gearbox::gear::GearPosition;
use crate::gearbox::gearbox_handle::GearboxSettings;
use crate::gearbox::speed_controller::{ControllerState, GearSpeedController, ShiftOutcome};

// Discrete input delivered to the worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GearboxCommand {
    SetAccelerator(bool),
    SetBrake(bool),
    SetClutch(bool),
    RequestGear(GearPosition),
}

// Worker states: no timer while idle, exactly one interval while ticking
#[state]
#[derive(Debug, Clone)]
pub enum DriveState {
    Idle,
    Ticking,
}

#[machine]
#[derive(Debug)]
pub struct GearboxWorker<S: DriveState> {
    // Receiver for input commands
    command_receiver: mpsc::Receiver<GearboxCommand>,

    settings: GearboxSettings,

    // The state machine being driven
    controller: GearSpeedController,

    // Watch channel sender for renderer snapshots
    state_sender: watch::Sender<ControllerState>,

    // Only `Some` while Ticking
    ticker: Option<Interval>,

    stats: WorkerStats,
}

// Where the worker goes after one step
#[derive(Debug)]
pub enum WorkerStep {
    Idle(GearboxWorker<Idle>),
    Ticking(GearboxWorker<Ticking>),
    Stopped,
}

#[derive(Debug, Default)]
struct WorkerStats {
    commands: u64,
    ticks: u64,
    rejected_shifts: u64,
}

// Methods available in all states
impl<S: DriveState> GearboxWorker<S> {
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state_sender.subscribe()
    }

    pub fn settings(&self) -> &GearboxSettings {
        &self.settings
    }

    fn apply(&mut self, command: GearboxCommand) {
        debug!("Applying command: {:?}", command);
        self.stats.commands += 1;
        match command {
            GearboxCommand::SetAccelerator(pressed) => {
                self.controller.set_accelerator_pressed(pressed)
            }
            GearboxCommand::SetBrake(pressed) => self.controller.set_brake_pressed(pressed),
            GearboxCommand::SetClutch(pressed) => self.controller.set_clutch_pressed(pressed),
            GearboxCommand::RequestGear(target) => {
                if self.controller.request_gear_change(target, Instant::now())
                    == ShiftOutcome::RejectedClutchDisengaged
                {
                    self.stats.rejected_shifts += 1;
                }
            }
        }
    }

    fn expire_warning(&mut self) {
        self.controller.expire_clutch_warning(Instant::now());
    }

    // Snapshot goes out after every event or tick; send_replace keeps the
    // latest value even while no renderer is subscribed
    fn publish(&self) {
        let snapshot = *self.controller.state();
        self.state_sender.send_replace(snapshot);
    }
}

impl GearboxWorker<Idle> {
    pub fn create(
        command_receiver: mpsc::Receiver<GearboxCommand>,
        settings: GearboxSettings,
        controller: GearSpeedController,
    ) -> Self {
        info!("Creating Gearbox Worker with settings: {:?}", settings);

        let initial = *controller.state();
        let (state_sender, _) = watch::channel(initial);
        debug!("Created watch channel for gearbox snapshots");

        Self::new(
            command_receiver,
            settings,
            controller,
            state_sender,
            None,
            WorkerStats::default(),
        )
    }

    // Waits for the next command or warning expiry; no timer is running
    pub async fn wait_for_input(mut self) -> WorkerStep {
        let deadline = self.controller.clutch_warning_deadline();
        tokio::select! {
            command = self.command_receiver.recv() => match command {
                Some(command) => self.apply(command),
                None => {
                    info!("Command channel closed, stopping idle gearbox worker");
                    return WorkerStep::Stopped;
                }
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                self.expire_warning();
            }
        }

        self.publish();
        self.settle()
    }

    fn settle(mut self) -> WorkerStep {
        if !self.controller.needs_ticking() {
            return WorkerStep::Idle(self);
        }

        let period = self.settings.tick_interval();
        debug!("Starting tick loop with {:?} period", period);
        self.ticker = Some(interval_at(Instant::now() + period, period));
        WorkerStep::Ticking(self.transition())
    }
}

impl GearboxWorker<Ticking> {
    // Waits for the next tick, command or warning expiry
    pub async fn drive(mut self) -> WorkerStep {
        let deadline = self.controller.clutch_warning_deadline();
        tokio::select! {
            command = self.command_receiver.recv() => match command {
                Some(command) => self.apply(command),
                None => {
                    info!("Command channel closed, stopping ticking gearbox worker");
                    self.ticker = None;
                    return WorkerStep::Stopped;
                }
            },
            _ = next_tick(&mut self.ticker) => {
                self.controller.tick();
                self.stats.ticks += 1;
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                self.expire_warning();
            }
        }

        self.publish();
        self.settle()
    }

    fn settle(mut self) -> WorkerStep {
        if self.controller.needs_ticking() {
            return WorkerStep::Ticking(self);
        }

        debug!(
            "Stopping tick loop at {} km/h in {}",
            self.controller.state().speed,
            self.controller.state().current_gear
        );
        self.ticker = None;
        WorkerStep::Idle(self.transition())
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}

// Drives the worker until every command sender is gone
pub async fn run_gearbox_loop(worker: GearboxWorker<Idle>) {
    info!(
        "Starting gearbox loop with {}ms tick period",
        worker.settings().tick_interval_ms
    );

    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);
    let mut step = WorkerStep::Idle(worker);

    loop {
        step = match step {
            WorkerStep::Idle(worker) => worker.wait_for_input().await,
            WorkerStep::Ticking(worker) => worker.drive().await,
            WorkerStep::Stopped => {
                info!("Gearbox loop finished");
                return;
            }
        };

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            let elapsed_seconds = (now - last_stats_time).num_seconds().max(1);
            match &mut step {
                WorkerStep::Idle(worker) => log_stats(&mut worker.stats, elapsed_seconds),
                WorkerStep::Ticking(worker) => log_stats(&mut worker.stats, elapsed_seconds),
                WorkerStep::Stopped => {}
            }
            last_stats_time = now;
        }
    }
}

fn log_stats(stats: &mut WorkerStats, elapsed_seconds: i64) {
    info!(
        "Gearbox stats: {} commands, {} ticks, {} rejected shifts in {} seconds",
        stats.commands, stats.ticks, stats.rejected_shifts, elapsed_seconds
    );
    *stats = WorkerStats::default();
}
