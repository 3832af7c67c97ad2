//! # UI Common Components and Utilities
//!
//! Shared colors and frame helpers for the gearbox window. Everything here is
//! stateless; the views rebuild themselves from the latest
//! [`ControllerState`](crate::gearbox::ControllerState) every frame.

use eframe::egui::{Color32, Frame, Stroke};

/// Color palette for the dark gearbox theme.
///
/// Background colors run from darkest to lightest; the pedal colors are reused
/// by the speed readout and the pedal arrows.
pub struct UiColors;

impl UiColors {
    /// Window background (RGB: 17, 24, 39)
    pub const MAIN_BG: Color32 = Color32::from_rgb(17, 24, 39);

    /// Shifter housing (RGB: 31, 41, 55)
    pub const HOUSING_BG: Color32 = Color32::from_rgb(31, 41, 55);

    /// Housing rim (RGB: 75, 85, 99)
    pub const BORDER: Color32 = Color32::from_rgb(75, 85, 99);

    /// Gate slots of the H-pattern (RGB: 156, 163, 175)
    pub const GATE: Color32 = Color32::from_rgb(156, 163, 175);

    /// Knob fill (RGB: 74, 222, 128)
    pub const KNOB: Color32 = Color32::from_rgb(74, 222, 128);

    /// Neutral label highlight (RGB: 250, 204, 21)
    pub const NEUTRAL_LABEL: Color32 = Color32::from_rgb(250, 204, 21);

    /// Accelerating readout and arrows (RGB: 34, 197, 94)
    pub const ACCELERATING: Color32 = Color32::from_rgb(34, 197, 94);

    /// Braking readout, arrows and the clutch warning (RGB: 239, 68, 68)
    pub const BRAKING: Color32 = Color32::from_rgb(239, 68, 68);

    /// Secondary text such as units and the controls hint (RGB: 156, 163, 175)
    pub const MUTED_TEXT: Color32 = Color32::from_rgb(156, 163, 175);
}

/// Creates the rounded housing frame around the shifter.
pub fn housing_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(4.0, UiColors::BORDER))
        .fill(UiColors::HOUSING_BG)
        .corner_radius(24)
        .inner_margin(24)
        .outer_margin(2)
}
