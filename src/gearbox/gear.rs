//! Gear positions of the five-speed H-pattern shifter
//!
//! Holds the static data attached to each position: the speed cap reached while
//! accelerating and the knob coordinates the shifter view renders.

use std::fmt;

/// Coordinates of the knob inside the 180x150 shifter gate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnobPosition {
    pub x: f32,
    pub y: f32,
}

/// Selectable gear position; exactly one is engaged at any time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GearPosition {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Reverse,
    #[default]
    Neutral,
}

impl GearPosition {
    pub const ALL: [GearPosition; 7] = [
        GearPosition::First,
        GearPosition::Second,
        GearPosition::Third,
        GearPosition::Fourth,
        GearPosition::Fifth,
        GearPosition::Reverse,
        GearPosition::Neutral,
    ];

    /// Signed speed limit in km/h while accelerating in this gear
    ///
    /// Reverse carries a negative cap. Neutral has no entry because the
    /// accelerator has no effect there.
    pub const fn speed_cap(self) -> Option<i32> {
        match self {
            GearPosition::Reverse => Some(-30),
            GearPosition::First => Some(20),
            GearPosition::Second => Some(40),
            GearPosition::Third => Some(70),
            GearPosition::Fourth => Some(100),
            GearPosition::Fifth => Some(150),
            GearPosition::Neutral => None,
        }
    }

    pub const fn is_neutral(self) -> bool {
        matches!(self, GearPosition::Neutral)
    }

    /// Parses the gear selection keys `1`-`5`, `r` and `n` (any case)
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            '1' => Some(GearPosition::First),
            '2' => Some(GearPosition::Second),
            '3' => Some(GearPosition::Third),
            '4' => Some(GearPosition::Fourth),
            '5' => Some(GearPosition::Fifth),
            'r' => Some(GearPosition::Reverse),
            'n' => Some(GearPosition::Neutral),
            _ => None,
        }
    }

    /// Where the knob rests in the gate for this gear
    pub const fn knob_position(self) -> KnobPosition {
        let (x, y) = match self {
            GearPosition::First => (18.0, 10.0),
            GearPosition::Second => (18.0, 100.0),
            GearPosition::Third => (83.0, 10.0),
            GearPosition::Fourth => (83.0, 100.0),
            GearPosition::Fifth => (148.0, 10.0),
            GearPosition::Reverse => (148.0, 100.0),
            GearPosition::Neutral => (83.0, 60.0),
        };
        KnobPosition { x, y }
    }
}

impl fmt::Display for GearPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            GearPosition::First => "1",
            GearPosition::Second => "2",
            GearPosition::Third => "3",
            GearPosition::Fourth => "4",
            GearPosition::Fifth => "5",
            GearPosition::Reverse => "R",
            GearPosition::Neutral => "N",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_follow_gear_direction() {
        assert_eq!(GearPosition::Reverse.speed_cap(), Some(-30));
        assert_eq!(GearPosition::Fifth.speed_cap(), Some(150));
        assert_eq!(GearPosition::Neutral.speed_cap(), None);

        for gear in GearPosition::ALL {
            match (gear, gear.speed_cap()) {
                (GearPosition::Neutral, cap) => assert!(cap.is_none()),
                (GearPosition::Reverse, Some(cap)) => assert!(cap < 0),
                (_, Some(cap)) => assert!(cap > 0),
                (gear, None) => panic!("{gear} is missing a cap"),
            }
        }
    }

    #[test]
    fn gear_keys_are_case_insensitive() {
        assert_eq!(GearPosition::from_key('r'), Some(GearPosition::Reverse));
        assert_eq!(GearPosition::from_key('R'), Some(GearPosition::Reverse));
        assert_eq!(GearPosition::from_key('N'), Some(GearPosition::Neutral));
        assert_eq!(GearPosition::from_key('4'), Some(GearPosition::Fourth));
        assert_eq!(GearPosition::from_key('6'), None);
        assert_eq!(GearPosition::from_key('a'), None);
    }

    #[test]
    fn display_matches_shifter_labels() {
        let labels: Vec<String> = GearPosition::ALL.iter().map(|g| g.to_string()).collect();
        assert_eq!(labels, ["1", "2", "3", "4", "5", "R", "N"]);
    }

    #[test]
    fn neutral_sits_in_the_middle_of_the_gate() {
        let neutral = GearPosition::Neutral.knob_position();
        let third = GearPosition::Third.knob_position();
        let fourth = GearPosition::Fourth.knob_position();
        assert_eq!(neutral.x, third.x);
        assert!(third.y < neutral.y && neutral.y < fourth.y);
    }
}
