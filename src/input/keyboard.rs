//! Keyboard mapping for the gearbox controls
//!
//! `a` accelerator, `b` brake, `c` clutch, `1`-`5`, `r`, `n` gear selection.
//! Matching is case-insensitive.

use eframe::egui::Key;

use crate::gearbox::{GearPosition, GearboxCommand};

/// What a recognized key controls
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    Accelerator,
    Brake,
    Clutch,
    SelectGear(GearPosition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyTransition {
    Down,
    Up,
}

/// Looks up the action bound to a key identifier
///
/// Multi-character identifiers (`"Enter"`, `"ArrowUp"`, ...) are never bound.
pub fn action_for_key(key: &str) -> Option<ControlAction> {
    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    match c.to_ascii_lowercase() {
        'a' => Some(ControlAction::Accelerator),
        'b' => Some(ControlAction::Brake),
        'c' => Some(ControlAction::Clutch),
        other => GearPosition::from_key(other).map(ControlAction::SelectGear),
    }
}

/// Converts an action edge into a gearbox command
///
/// Pedals follow the key state on both edges. Gear selection fires on key-down
/// only; releasing a gear key does nothing.
pub fn command_for(action: ControlAction, transition: KeyTransition) -> Option<GearboxCommand> {
    let pressed = transition == KeyTransition::Down;
    match action {
        ControlAction::Accelerator => Some(GearboxCommand::SetAccelerator(pressed)),
        ControlAction::Brake => Some(GearboxCommand::SetBrake(pressed)),
        ControlAction::Clutch => Some(GearboxCommand::SetClutch(pressed)),
        ControlAction::SelectGear(gear) if pressed => Some(GearboxCommand::RequestGear(gear)),
        ControlAction::SelectGear(_) => None,
    }
}

/// Key identifier for the egui keys the gearbox listens to
pub fn key_from_egui(key: Key) -> Option<&'static str> {
    match key {
        Key::A => Some("a"),
        Key::B => Some("b"),
        Key::C => Some("c"),
        Key::Num1 => Some("1"),
        Key::Num2 => Some("2"),
        Key::Num3 => Some("3"),
        Key::Num4 => Some("4"),
        Key::Num5 => Some("5"),
        Key::R => Some("r"),
        Key::N => Some("n"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pedal_keys_in_both_cases() {
        assert_eq!(action_for_key("a"), Some(ControlAction::Accelerator));
        assert_eq!(action_for_key("A"), Some(ControlAction::Accelerator));
        assert_eq!(action_for_key("B"), Some(ControlAction::Brake));
        assert_eq!(action_for_key("c"), Some(ControlAction::Clutch));
    }

    #[test]
    fn gear_keys() {
        assert_eq!(
            action_for_key("5"),
            Some(ControlAction::SelectGear(GearPosition::Fifth))
        );
        assert_eq!(
            action_for_key("R"),
            Some(ControlAction::SelectGear(GearPosition::Reverse))
        );
        assert_eq!(
            action_for_key("n"),
            Some(ControlAction::SelectGear(GearPosition::Neutral))
        );
    }

    #[test]
    fn unrecognized_keys_have_no_action() {
        for key in ["", "x", "0", "6", " ", "Enter", "ab", "Shift", "ä"] {
            assert_eq!(action_for_key(key), None, "key {key:?}");
        }
    }

    #[test]
    fn gear_keys_only_act_on_key_down() {
        let reverse = ControlAction::SelectGear(GearPosition::Reverse);
        assert_eq!(
            command_for(reverse, KeyTransition::Down),
            Some(GearboxCommand::RequestGear(GearPosition::Reverse))
        );
        assert_eq!(command_for(reverse, KeyTransition::Up), None);
    }

    #[test]
    fn pedals_follow_key_state() {
        assert_eq!(
            command_for(ControlAction::Clutch, KeyTransition::Down),
            Some(GearboxCommand::SetClutch(true))
        );
        assert_eq!(
            command_for(ControlAction::Brake, KeyTransition::Up),
            Some(GearboxCommand::SetBrake(false))
        );
    }

    #[test]
    fn egui_keys_resolve_to_the_same_bindings() {
        assert_eq!(
            key_from_egui(Key::Num3).and_then(action_for_key),
            Some(ControlAction::SelectGear(GearPosition::Third))
        );
        assert_eq!(
            key_from_egui(Key::A).and_then(action_for_key),
            Some(ControlAction::Accelerator)
        );
        assert_eq!(key_from_egui(Key::Enter), None);
        assert_eq!(key_from_egui(Key::Num6), None);
    }
}
