//! Gearbox subsystem: gear selection, pedals and speed
//!
//! Split into a synchronous core and its async runtime:
//!
//! 1. [`gear`] - Gear positions, speed caps and knob coordinates
//! 2. [`speed_controller`] - The gear/speed state machine
//! 3. [`worker`] - Tick loop driving the state machine on a timer
//! 4. [`gearbox_handle`] - Unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! Keyboard ──► GearboxHandle ──► Worker ──► watch<ControllerState> ──► UI
//!              (commands)        (Idle/Ticking)
//!                                   │
//!                                   └──► GearboxObserver callbacks
//! ```
//!
//! The worker only runs a timer while a tick would change the speed, and never
//! more than one at a time.

pub mod gear;
pub mod gearbox_handle;
pub mod speed_controller;
pub mod worker;

pub use gear::{GearPosition, KnobPosition};
pub use gearbox_handle::{GearboxError, GearboxHandle, GearboxSettings};
pub use speed_controller::{ControllerState, GearSpeedController, GearboxObserver, ShiftOutcome};
pub use worker::GearboxCommand;
