//! Gear/speed state machine
//!
//! [`GearSpeedController`] owns the [`ControllerState`] aggregate and defines how
//! gear requests, pedal flags and elapsed ticks combine into a speed value. It is
//! fully synchronous: the caller injects the clock (`now`) and drives [`tick`]
//! from whatever timer it owns. Presentation concerns observe it through
//! [`GearboxObserver`] callbacks.
//!
//! [`tick`]: GearSpeedController::tick

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::gear::GearPosition;

/// Speed gained per tick while accelerating (km/h)
pub const ACCELERATION_STEP: i32 = 1;

/// Speed shed per tick while braking (km/h)
pub const BRAKE_STEP: i32 = 2;

/// Speed shed per tick while coasting in neutral (km/h)
pub const NEUTRAL_DECAY_STEP: i32 = 1;

/// Read-only snapshot handed to renderers after every event or tick
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub current_gear: GearPosition,
    /// Signed km/h; negative while reversing
    pub speed: i32,
    pub accelerator_pressed: bool,
    pub brake_pressed: bool,
    pub clutch_pressed: bool,
    pub clutch_warning_active: bool,
}

/// Result of a gear change request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOutcome {
    Engaged {
        from: GearPosition,
        to: GearPosition,
    },
    RejectedClutchDisengaged,
}

/// Receiver of fire-and-forget notifications (audio cues, animations, warnings)
///
/// Callbacks run synchronously inside the controller and must not block.
pub trait GearboxObserver: Send {
    /// A shift went through. Also fires when `from == to`.
    fn on_gear_changed(&mut self, _from: GearPosition, _to: GearPosition) {}

    /// The clutch warning was raised (`true`) or expired (`false`)
    fn on_clutch_warning(&mut self, _active: bool) {}
}

pub struct GearSpeedController {
    state: ControllerState,
    clutch_warning_window: Duration,
    clutch_warning_deadline: Option<Instant>,
    observers: Vec<Box<dyn GearboxObserver>>,
}

impl fmt::Debug for GearSpeedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GearSpeedController")
            .field("state", &self.state)
            .field("clutch_warning_window", &self.clutch_warning_window)
            .field("clutch_warning_deadline", &self.clutch_warning_deadline)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl GearSpeedController {
    /// Creates a controller in neutral, standing still, with every pedal released
    pub fn new(clutch_warning_window: Duration) -> Self {
        Self {
            state: ControllerState::default(),
            clutch_warning_window,
            clutch_warning_deadline: None,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn GearboxObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Attempts to move the lever to `target`
    ///
    /// Without the clutch the request is rejected: gear and speed stay as they
    /// are and the clutch warning is (re)armed for the configured window.
    pub fn request_gear_change(&mut self, target: GearPosition, now: Instant) -> ShiftOutcome {
        if !self.state.clutch_pressed {
            warn!(
                "Rejected shift {} -> {}: clutch not pressed",
                self.state.current_gear, target
            );
            self.state.clutch_warning_active = true;
            self.clutch_warning_deadline = Some(now + self.clutch_warning_window);
            for observer in self.observers.iter_mut() {
                observer.on_clutch_warning(true);
            }
            return ShiftOutcome::RejectedClutchDisengaged;
        }

        let from = self.state.current_gear;
        self.state.current_gear = target;
        info!("Shifted {} -> {} at {} km/h", from, target, self.state.speed);
        for observer in self.observers.iter_mut() {
            observer.on_gear_changed(from, target);
        }
        ShiftOutcome::Engaged { from, to: target }
    }

    pub fn set_accelerator_pressed(&mut self, pressed: bool) {
        self.state.accelerator_pressed = pressed;
    }

    pub fn set_brake_pressed(&mut self, pressed: bool) {
        self.state.brake_pressed = pressed;
    }

    pub fn set_clutch_pressed(&mut self, pressed: bool) {
        self.state.clutch_pressed = pressed;
    }

    /// Advances speed by one period and returns the new speed
    ///
    /// Precedence: neutral decay, then accelerator, then brake. With no pedal
    /// pressed outside neutral the speed holds.
    pub fn tick(&mut self) -> i32 {
        let state = &mut self.state;
        let speed = state.speed;

        state.speed = if state.current_gear.is_neutral() {
            approach_zero(speed, NEUTRAL_DECAY_STEP)
        } else if state.accelerator_pressed {
            match state.current_gear.speed_cap() {
                Some(cap) if cap < 0 => (speed - ACCELERATION_STEP).max(cap),
                Some(cap) => (speed + ACCELERATION_STEP).min(cap),
                None => speed,
            }
        } else if state.brake_pressed {
            approach_zero(speed, BRAKE_STEP)
        } else {
            speed
        };

        if state.speed != speed {
            debug!(
                "Tick in {}: {} -> {} km/h",
                state.current_gear, speed, state.speed
            );
        }
        state.speed
    }

    /// Whether a recurring tick would change anything right now
    ///
    /// In gear: a pedal is held. In neutral: the car is still rolling.
    pub fn needs_ticking(&self) -> bool {
        let state = &self.state;
        if state.current_gear.is_neutral() {
            state.speed != 0
        } else {
            state.accelerator_pressed || state.brake_pressed
        }
    }

    pub fn clutch_warning_deadline(&self) -> Option<Instant> {
        self.clutch_warning_deadline
    }

    /// Clears the clutch warning once its window has elapsed
    ///
    /// Returns `true` when the warning was cleared by this call.
    pub fn expire_clutch_warning(&mut self, now: Instant) -> bool {
        match self.clutch_warning_deadline {
            Some(deadline) if now >= deadline => {
                self.clutch_warning_deadline = None;
                self.state.clutch_warning_active = false;
                debug!("Clutch warning expired");
                for observer in self.observers.iter_mut() {
                    observer.on_clutch_warning(false);
                }
                true
            }
            _ => false,
        }
    }
}

// Moves `speed` toward zero by at most `step` without crossing it
fn approach_zero(speed: i32, step: i32) -> i32 {
    if speed > 0 {
        (speed - step).max(0)
    } else if speed < 0 {
        (speed + step).min(0)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const WINDOW: Duration = Duration::from_millis(1500);

    #[derive(Debug, PartialEq)]
    enum Note {
        Gear(GearPosition, GearPosition),
        Warning(bool),
    }

    struct Recorder(Arc<Mutex<Vec<Note>>>);

    impl GearboxObserver for Recorder {
        fn on_gear_changed(&mut self, from: GearPosition, to: GearPosition) {
            self.0.lock().unwrap().push(Note::Gear(from, to));
        }

        fn on_clutch_warning(&mut self, active: bool) {
            self.0.lock().unwrap().push(Note::Warning(active));
        }
    }

    fn recorded() -> (GearSpeedController, Arc<Mutex<Vec<Note>>>) {
        let notes = Arc::new(Mutex::new(Vec::new()));
        let mut controller = GearSpeedController::new(WINDOW);
        controller.add_observer(Box::new(Recorder(notes.clone())));
        (controller, notes)
    }

    fn in_gear(gear: GearPosition) -> GearSpeedController {
        let mut controller = GearSpeedController::new(WINDOW);
        controller.set_clutch_pressed(true);
        controller.request_gear_change(gear, Instant::now());
        controller.set_clutch_pressed(false);
        controller
    }

    fn ticks(controller: &mut GearSpeedController, n: usize) -> i32 {
        for _ in 0..n {
            controller.tick();
        }
        controller.state().speed
    }

    #[test]
    fn starts_in_neutral_at_rest() {
        let controller = GearSpeedController::new(WINDOW);
        assert_eq!(*controller.state(), ControllerState::default());
        assert_eq!(controller.state().current_gear, GearPosition::Neutral);
        assert!(!controller.needs_ticking());
        assert!(controller.clutch_warning_deadline().is_none());
    }

    #[test]
    fn shift_without_clutch_is_rejected_for_every_gear() {
        for target in GearPosition::ALL {
            let mut controller = in_gear(GearPosition::Second);
            controller.state.speed = 25;

            let outcome = controller.request_gear_change(target, Instant::now());

            assert_eq!(outcome, ShiftOutcome::RejectedClutchDisengaged);
            assert_eq!(controller.state().current_gear, GearPosition::Second);
            assert_eq!(controller.state().speed, 25);
            assert!(controller.state().clutch_warning_active);
        }
    }

    #[test]
    fn shift_with_clutch_engages_any_gear_from_any_gear() {
        for from in GearPosition::ALL {
            for to in GearPosition::ALL {
                let mut controller = in_gear(from);
                controller.set_clutch_pressed(true);

                let outcome = controller.request_gear_change(to, Instant::now());

                assert_eq!(outcome, ShiftOutcome::Engaged { from, to });
                assert_eq!(controller.state().current_gear, to);
                assert!(!controller.state().clutch_warning_active);
            }
        }
    }

    #[test]
    fn shift_leaves_speed_untouched() {
        let mut controller = in_gear(GearPosition::Fourth);
        controller.state.speed = 90;
        controller.set_clutch_pressed(true);
        controller.request_gear_change(GearPosition::Second, Instant::now());
        assert_eq!(controller.state().speed, 90);
    }

    #[test]
    fn observers_hear_shifts_and_warnings() {
        let (mut controller, notes) = recorded();
        let t0 = Instant::now();

        controller.request_gear_change(GearPosition::First, t0);
        controller.set_clutch_pressed(true);
        controller.request_gear_change(GearPosition::First, t0);
        controller.request_gear_change(GearPosition::First, t0);
        controller.expire_clutch_warning(t0 + WINDOW);

        assert_eq!(
            *notes.lock().unwrap(),
            vec![
                Note::Warning(true),
                Note::Gear(GearPosition::Neutral, GearPosition::First),
                Note::Gear(GearPosition::First, GearPosition::First),
                Note::Warning(false),
            ]
        );
    }

    #[test]
    fn third_gear_accelerates_to_cap_without_overshoot() {
        let mut controller = in_gear(GearPosition::Third);
        controller.set_accelerator_pressed(true);

        assert_eq!(ticks(&mut controller, 1), 1);
        assert_eq!(ticks(&mut controller, 69), 70);
        assert_eq!(ticks(&mut controller, 1), 70);
    }

    #[test]
    fn reverse_accelerates_to_negative_cap() {
        let mut controller = in_gear(GearPosition::Reverse);
        controller.set_accelerator_pressed(true);

        assert_eq!(ticks(&mut controller, 30), -30);
        assert_eq!(ticks(&mut controller, 10), -30);
    }

    #[test]
    fn accelerating_past_a_lower_cap_clamps_to_it() {
        let mut controller = in_gear(GearPosition::First);
        controller.state.speed = 120;
        controller.set_accelerator_pressed(true);

        assert_eq!(ticks(&mut controller, 1), 20);
    }

    #[test]
    fn brake_sheds_two_per_tick_and_stops_at_zero() {
        let mut controller = in_gear(GearPosition::Third);
        controller.state.speed = 50;
        controller.set_brake_pressed(true);

        assert_eq!(ticks(&mut controller, 1), 48);
        assert_eq!(ticks(&mut controller, 24), 0);
        assert_eq!(ticks(&mut controller, 3), 0);
    }

    #[test]
    fn brake_never_flips_sign() {
        let mut controller = in_gear(GearPosition::Reverse);
        controller.state.speed = -3;
        controller.set_brake_pressed(true);

        assert_eq!(ticks(&mut controller, 1), -1);
        assert_eq!(ticks(&mut controller, 1), 0);

        let mut controller = in_gear(GearPosition::First);
        controller.state.speed = 1;
        controller.set_brake_pressed(true);
        assert_eq!(ticks(&mut controller, 1), 0);
    }

    #[test]
    fn accelerator_wins_over_brake() {
        let mut controller = in_gear(GearPosition::Second);
        controller.state.speed = 10;
        controller.set_accelerator_pressed(true);
        controller.set_brake_pressed(true);

        assert_eq!(ticks(&mut controller, 1), 11);
    }

    #[test]
    fn neutral_coasts_down_one_per_tick_ignoring_pedals() {
        let mut controller = in_gear(GearPosition::Second);
        controller.state.speed = 40;
        controller.set_clutch_pressed(true);
        controller.request_gear_change(GearPosition::Neutral, Instant::now());
        controller.set_accelerator_pressed(true);

        assert_eq!(ticks(&mut controller, 1), 39);
        assert_eq!(ticks(&mut controller, 39), 0);
        assert_eq!(ticks(&mut controller, 5), 0);

        controller.state.speed = -4;
        assert_eq!(ticks(&mut controller, 4), 0);
    }

    #[test]
    fn idle_in_gear_holds_speed() {
        let mut controller = in_gear(GearPosition::Fifth);
        controller.state.speed = 120;

        assert_eq!(ticks(&mut controller, 10), 120);
        assert!(!controller.needs_ticking());
    }

    #[test]
    fn tick_gate_follows_gear_and_pedals() {
        let mut controller = GearSpeedController::new(WINDOW);
        controller.set_accelerator_pressed(true);
        assert!(!controller.needs_ticking(), "neutral at rest");

        controller.state.speed = 5;
        assert!(controller.needs_ticking(), "neutral while rolling");

        let mut controller = in_gear(GearPosition::First);
        assert!(!controller.needs_ticking());
        controller.set_brake_pressed(true);
        assert!(controller.needs_ticking());
        controller.set_brake_pressed(false);
        controller.set_accelerator_pressed(true);
        assert!(controller.needs_ticking());
    }

    #[test]
    fn clutch_warning_expires_after_window() {
        let mut controller = GearSpeedController::new(WINDOW);
        let t0 = Instant::now();

        controller.request_gear_change(GearPosition::Third, t0);
        assert_eq!(controller.clutch_warning_deadline(), Some(t0 + WINDOW));

        assert!(!controller.expire_clutch_warning(t0 + Duration::from_millis(1499)));
        assert!(controller.state().clutch_warning_active);

        assert!(controller.expire_clutch_warning(t0 + WINDOW));
        assert!(!controller.state().clutch_warning_active);
        assert!(controller.clutch_warning_deadline().is_none());
        assert!(!controller.expire_clutch_warning(t0 + WINDOW * 2));
    }

    #[test]
    fn repeated_rejection_restarts_the_window() {
        let mut controller = GearSpeedController::new(WINDOW);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(1000);

        controller.request_gear_change(GearPosition::First, t0);
        controller.request_gear_change(GearPosition::First, t1);

        assert!(!controller.expire_clutch_warning(t0 + WINDOW));
        assert!(controller.state().clutch_warning_active);
        assert!(controller.expire_clutch_warning(t1 + WINDOW));
    }

    #[test]
    fn pedal_setters_only_touch_their_flag() {
        let mut controller = GearSpeedController::new(WINDOW);
        controller.set_brake_pressed(true);
        controller.set_clutch_pressed(true);

        let state = controller.state();
        assert!(state.brake_pressed && state.clutch_pressed);
        assert!(!state.accelerator_pressed);
        assert_eq!(state.speed, 0);
        assert_eq!(state.current_gear, GearPosition::Neutral);
    }
}
