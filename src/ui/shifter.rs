//! H-pattern shifter view with an animated knob
//!
//! On every engaged shift the knob travels back to neutral and then into the
//! target slot, the way a real lever moves through the gate.

use eframe::egui::{self, vec2, Align2, FontId, Pos2, Sense, Stroke, Ui, Vec2};
use std::time::{Duration, Instant};

use super::common::UiColors;
use crate::gearbox::{GearPosition, KnobPosition};

/// Lever travel from the current slot back to neutral
pub const TO_NEUTRAL: Duration = Duration::from_millis(150);

/// Lever travel from neutral into the target slot
pub const TO_TARGET: Duration = Duration::from_millis(250);

const GATE_SIZE: Vec2 = vec2(180.0, 150.0);
const KNOB_RADIUS: f32 = 10.0;

// Label anchors (top-left) inside the gate
const LABELS: [(&str, f32, f32); 7] = [
    ("1", 17.0, 0.0),
    ("2", 17.0, 105.0),
    ("3", 82.0, 0.0),
    ("4", 82.0, 105.0),
    ("5", 147.0, 0.0),
    ("R", 150.0, 105.0),
    ("N", 87.0, 48.0),
];

#[derive(Clone, Debug)]
pub struct KnobAnimation {
    from: KnobPosition,
    to: KnobPosition,
    started: Option<Instant>,
}

impl KnobAnimation {
    /// A knob resting in `gear`'s slot
    pub fn resting(gear: GearPosition) -> Self {
        let position = gear.knob_position();
        Self {
            from: position,
            to: position,
            started: None,
        }
    }

    /// Starts a new travel toward `target` from wherever the knob is at `now`
    pub fn start(&mut self, target: GearPosition, now: Instant) {
        self.from = self.position_at(now);
        self.to = target.knob_position();
        self.started = Some(now);
    }

    pub fn is_running(&self, now: Instant) -> bool {
        match self.started {
            Some(started) => now.saturating_duration_since(started) < TO_NEUTRAL + TO_TARGET,
            None => false,
        }
    }

    pub fn position_at(&self, now: Instant) -> KnobPosition {
        let Some(started) = self.started else {
            return self.to;
        };
        let neutral = GearPosition::Neutral.knob_position();
        let elapsed = now.saturating_duration_since(started);

        if elapsed < TO_NEUTRAL {
            let t = elapsed.as_secs_f32() / TO_NEUTRAL.as_secs_f32();
            lerp(self.from, neutral, ease_in_out(t))
        } else if elapsed < TO_NEUTRAL + TO_TARGET {
            let t = (elapsed - TO_NEUTRAL).as_secs_f32() / TO_TARGET.as_secs_f32();
            lerp(neutral, self.to, ease_in_out(t))
        } else {
            self.to
        }
    }
}

fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn lerp(a: KnobPosition, b: KnobPosition, t: f32) -> KnobPosition {
    KnobPosition {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// Paints the gate, labels and knob
pub fn render(ui: &mut Ui, knob: KnobPosition) {
    let (response, painter) = ui.allocate_painter(GATE_SIZE, Sense::hover());
    let origin = response.rect.min;
    let at = |x: f32, y: f32| Pos2::new(origin.x + x, origin.y + y);
    let gate = Stroke::new(3.0, UiColors::GATE);

    // Three vertical slots joined by the neutral crossbar
    for x in [26.5, 91.5, 156.5] {
        painter.line_segment([at(x, 20.0), at(x, 110.0)], gate);
    }
    painter.line_segment([at(25.0, 66.5), at(155.0, 66.5)], gate);

    for (text, x, y) in LABELS {
        let color = if text == "N" {
            UiColors::NEUTRAL_LABEL
        } else {
            egui::Color32::WHITE
        };
        painter.text(
            at(x, y),
            Align2::LEFT_TOP,
            text,
            FontId::proportional(14.0),
            color,
        );
    }

    let center = at(knob.x + KNOB_RADIUS, knob.y + KNOB_RADIUS);
    painter.circle(
        center,
        KNOB_RADIUS,
        UiColors::KNOB,
        Stroke::new(2.0, egui::Color32::WHITE),
    );
}
