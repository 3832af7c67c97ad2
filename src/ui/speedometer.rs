use eframe::egui::{Color32, RichText, Ui};

use super::common::UiColors;
use crate::gearbox::{ControllerState, GearPosition};

/// Readout color: red while braking, green while accelerating
pub fn readout_color(state: &ControllerState) -> Color32 {
    if state.brake_pressed {
        UiColors::BRAKING
    } else if state.accelerator_pressed {
        UiColors::ACCELERATING
    } else {
        Color32::WHITE
    }
}

/// Caption under the readout, e.g. `3 GEAR | KM/H`
pub fn caption(gear: GearPosition) -> String {
    if gear.is_neutral() {
        "N | KM/H".to_string()
    } else {
        format!("{} GEAR | KM/H", gear)
    }
}

// Arrow glyphs flanking the readout while a pedal is down
fn pedal_arrow(state: &ControllerState) -> Option<(&'static str, Color32)> {
    if state.accelerator_pressed {
        Some(("▲", UiColors::ACCELERATING))
    } else if state.brake_pressed {
        Some(("▼", UiColors::BRAKING))
    } else {
        None
    }
}

pub fn render(ui: &mut Ui, state: &ControllerState) {
    ui.vertical_centered(|ui| {
        ui.horizontal(|ui| {
            let arrow = pedal_arrow(state);
            if let Some((glyph, color)) = arrow {
                ui.label(RichText::new(glyph).size(28.0).color(color));
            }
            ui.label(
                RichText::new(state.speed.abs().to_string())
                    .size(72.0)
                    .strong()
                    .color(readout_color(state)),
            );
            if let Some((glyph, color)) = arrow {
                ui.label(RichText::new(glyph).size(28.0).color(color));
            }
        });
        ui.label(
            RichText::new(caption(state.current_gear))
                .size(20.0)
                .color(UiColors::MUTED_TEXT),
        );
    });
}
