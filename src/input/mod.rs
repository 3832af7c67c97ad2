//! Input translation for the gearbox simulator
//!
//! Turns raw key events into [`GearboxCommand`]s. Only the keyboard is
//! supported; unrecognized keys never reach the gearbox.
//!
//! [`GearboxCommand`]: crate::gearbox::GearboxCommand

pub mod keyboard;

pub use keyboard::{action_for_key, command_for, key_from_egui, ControlAction, KeyTransition};
