//! # Gearbox Simulator User Interface
//!
//! The window is a pure observer of the gearbox: it forwards keyboard events to
//! the [`GearboxHandle`] and redraws from the latest [`ControllerState`]
//! snapshot. It never mutates the state machine directly.
//!
//! ## Layout
//!
//! - **Left**: H-pattern shifter with the animated knob ([`shifter`])
//! - **Right**: speed readout and gear caption ([`speedometer`])
//! - **Bottom**: clutch warning and the controls hint
//!
//! ## Notifications
//!
//! Gear changes and clutch warnings arrive as [`GearboxNotification`]s sent by
//! [`UiNotifier`] from inside the worker. A gear change starts the knob travel;
//! a clutch warning starts the warning pulse. Both are fire-and-forget: a full
//! channel drops the notification instead of stalling the worker.

pub mod common;
pub mod shifter;
pub mod speedometer;

use eframe::egui::{self, Event, RichText};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::config::UIConfig;
use crate::gearbox::{ControllerState, GearPosition, GearboxHandle, GearboxObserver};
use crate::input::key_from_egui;

use self::common::{housing_frame, UiColors};
use self::shifter::KnobAnimation;

/// Period of one clutch warning pulse (fade in and out)
const WARNING_PULSE: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GearboxNotification {
    GearChanged { from: GearPosition, to: GearPosition },
    ClutchWarning(bool),
}

/// Observer forwarding gearbox notifications to the window
pub struct UiNotifier {
    sender: mpsc::Sender<GearboxNotification>,
}

impl UiNotifier {
    pub fn new(sender: mpsc::Sender<GearboxNotification>) -> Self {
        Self { sender }
    }

    fn forward(&self, notification: GearboxNotification) {
        if let Err(e) = self.sender.try_send(notification) {
            debug!("Dropped UI notification: {}", e);
        }
    }
}

impl GearboxObserver for UiNotifier {
    fn on_gear_changed(&mut self, from: GearPosition, to: GearPosition) {
        self.forward(GearboxNotification::GearChanged { from, to });
    }

    fn on_clutch_warning(&mut self, active: bool) {
        self.forward(GearboxNotification::ClutchWarning(active));
    }
}

pub struct GearboxUI {
    gearbox: GearboxHandle,

    /// Latest controller snapshot
    state_receiver: watch::Receiver<ControllerState>,

    notification_receiver: mpsc::Receiver<GearboxNotification>,

    knob: KnobAnimation,

    /// Start of the current clutch warning pulse
    warning_since: Option<Instant>,

    repaint_interval: Duration,
}

impl GearboxUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        gearbox: GearboxHandle,
        notification_receiver: mpsc::Receiver<GearboxNotification>,
        ui_config: &UIConfig,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        let state_receiver = gearbox.subscribe();
        let gear = state_receiver.borrow().current_gear;
        GearboxUI {
            gearbox,
            state_receiver,
            notification_receiver,
            knob: KnobAnimation::resting(gear),
            warning_since: None,
            repaint_interval: Duration::from_millis(ui_config.repaint_interval_ms),
        }
    }

    /// Sends this frame's key presses and releases to the gearbox
    ///
    /// Auto-repeat presses are skipped so holding a gear key shifts once.
    fn forward_key_events(&self, ctx: &egui::Context) {
        let keys: Vec<(egui::Key, bool)> = ctx.input(|input| {
            input
                .events
                .iter()
                .filter_map(|event| match event {
                    Event::Key {
                        key,
                        pressed,
                        repeat: false,
                        ..
                    } => Some((*key, *pressed)),
                    _ => None,
                })
                .collect()
        });

        for (key, pressed) in keys {
            let Some(name) = key_from_egui(key) else {
                continue;
            };
            let result = if pressed {
                self.gearbox.key_down(name)
            } else {
                self.gearbox.key_up(name)
            };
            if let Err(e) = result {
                warn!("Key {:?} not delivered: {}", name, e);
            }
        }
    }

    fn drain_notifications(&mut self, now: Instant) {
        while let Ok(notification) = self.notification_receiver.try_recv() {
            debug!("UI notification: {:?}", notification);
            match notification {
                GearboxNotification::GearChanged { to, .. } => self.knob.start(to, now),
                GearboxNotification::ClutchWarning(true) => self.warning_since = Some(now),
                GearboxNotification::ClutchWarning(false) => self.warning_since = None,
            }
        }
    }

    fn warning_alpha(&self, now: Instant) -> f32 {
        match self.warning_since {
            Some(since) => pulse_alpha(now.saturating_duration_since(since)),
            None => 1.0,
        }
    }
}

/// Opacity of the warning text: fades 0 -> 1 -> 0 once per pulse
fn pulse_alpha(elapsed: Duration) -> f32 {
    let phase = (elapsed.as_secs_f32() / WARNING_PULSE.as_secs_f32()).fract();
    1.0 - (2.0 * phase - 1.0).abs()
}

impl eframe::App for GearboxUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.forward_key_events(ctx);
        self.drain_notifications(now);

        let state = *self.state_receiver.borrow_and_update();

        egui::TopBottomPanel::bottom("controls_panel")
            .show_separator_line(false)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    if state.clutch_warning_active {
                        let color = UiColors::BRAKING.gamma_multiply(self.warning_alpha(now));
                        ui.label(
                            RichText::new("⚠ Press Clutch (C) to Shift Gear!")
                                .strong()
                                .color(color),
                        );
                    }
                    ui.label(
                        RichText::new(
                            "Controls: [A] Accelerate | [B] Brake | [C] Clutch | [1–5, R, N] Gears",
                        )
                        .small()
                        .color(UiColors::MUTED_TEXT),
                    );
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(UiColors::MAIN_BG).inner_margin(16))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Gearbox Simulator");
                });
                ui.add_space(24.0);
                ui.horizontal_centered(|ui| {
                    housing_frame().show(ui, |ui| {
                        shifter::render(ui, self.knob.position_at(now));
                    });
                    ui.add_space(64.0);
                    speedometer::render(ui, &state);
                });
            });

        if self.knob.is_running(now) || state.clutch_warning_active {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.repaint_interval);
        }
    }
}
