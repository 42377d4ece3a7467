use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use crate::actions::*;
use crate::config::Config;
use crate::error::Result;
use crate::feed::FeedSubscriber;
use crate::http::ReqwestHttpClient;
use crate::telemetry::{self, Dashboard, Telemetry};
use crate::viewport::Viewport;
use eframe::egui::{self, Color32, RichText};
use egui_modal::Modal;

pub fn init(config: Config) -> Result<()> {
    env_logger::init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([config.width, config.height]),
        ..Default::default()
    };
    let events_url = config.events_url()?;

    eframe::run_native(
        "IMU Telemetry",
        options,
        Box::new(move |cc| {
            let (telemetry_tx, telemetry_rx) = std::sync::mpsc::channel();
            let (trigger, tripwire) = stream_cancel::Tripwire::new();

            let subscriber = FeedSubscriber::new(
                events_url,
                telemetry::handlers(telemetry_tx, cc.egui_ctx.clone()),
            );
            tokio::spawn(async move {
                // dropping the trigger stops the feed together with the window
                tokio::select! {
                    _ = subscriber.run() => {}
                    _ = tripwire => log::debug!("feed stopped"),
                }
            });

            Ok(Box::new(MyApp::new(config, telemetry_rx, trigger)))
        }),
    )
    .map_err(|e| crate::error::Error::Config(format!("unable to open window: {e}")))
}

struct MyApp {
    telemetry_rx: Receiver<Telemetry>,
    clear_tx: Sender<ActionOutcome>,
    clear_rx: Receiver<ActionOutcome>,
    actions: Actions,
    dashboard: Dashboard,
    viewport: Option<Viewport>,
    clear_message: &'static str,
    _feed_trigger: stream_cancel::Trigger,
}

impl MyApp {
    fn new(config: Config, telemetry_rx: Receiver<Telemetry>, trigger: stream_cancel::Trigger) -> Self {
        let (clear_tx, clear_rx) = std::sync::mpsc::channel();
        Self {
            telemetry_rx,
            clear_tx,
            clear_rx,
            actions: Actions::new(Arc::new(ReqwestHttpClient::default()), config),
            dashboard: Dashboard::default(),
            viewport: None,
            clear_message: "",
            _feed_trigger: trigger,
        }
    }

    fn reset(&self, element_id: &'static str) {
        let actions = self.actions.clone();
        tokio::spawn(async move {
            let outcome = actions.reset(element_id).await;
            log::debug!("reset '{element_id}': {outcome:?}");
        });
    }

    fn clear(&self, ctx: &egui::Context, confirmation: Confirmation) {
        let actions = self.actions.clone();
        let clear_tx = self.clear_tx.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Some(outcome) = actions.clear(confirmation).await {
                clear_tx.send(outcome).ok();
                ctx.request_repaint();
            }
        });
    }

    fn readings(&self, ui: &mut egui::Ui) {
        let d = &self.dashboard;

        ui.heading("Gyroscope");
        egui::Grid::new("gyro_grid").num_columns(2).striped(true).show(ui, |ui| {
            for (axis, value) in ["X", "Y", "Z"].iter().zip(&d.gyro) {
                ui.label(format!("{axis} (°)"));
                ui.label(RichText::new(value).monospace());
                ui.end_row();
            }
        });
        ui.separator();

        ui.heading("Temperature");
        ui.label(RichText::new(format!("{} °C", d.temperature)).monospace());
        ui.separator();

        ui.heading("Accelerometer");
        egui::Grid::new("acc_grid").num_columns(2).striped(true).show(ui, |ui| {
            for (axis, value) in ["X", "Y", "Z"].iter().zip(&d.acc) {
                ui.label(format!("{axis} (m/s²)"));
                ui.label(RichText::new(value).monospace());
                ui.end_row();
            }
        });
        ui.separator();

        ui.heading("Recording");
        ui.label(RichText::new(&d.timer).monospace());
        ui.label(format!("Storage used: {} %", d.storage_percent));
        progress_bar(ui, d.progress_fill);
        ui.separator();
    }
}

/// Storage bar whose fill follows the reported percentage as is.
fn progress_bar(ui: &mut egui::Ui, percent: f64) {
    let size = egui::vec2(ui.available_width(), 12.0);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, 3.0, ui.visuals().extreme_bg_color);

    let mut fill = rect;
    fill.set_width(rect.width() * (percent / 100.0) as f32);
    painter.rect_filled(fill, 3.0, Color32::from_rgb(0x00, 0x77, 0xb6));
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for msg in self.telemetry_rx.try_iter() {
            self.dashboard.apply(msg);
        }

        let modal_result = Modal::new(ctx, "clear_result");
        modal_result.show(|ui| {
            modal_result.title(ui, "Clear Data");
            modal_result.frame(ui, |ui| {
                modal_result.body(ui, self.clear_message);
            });
            modal_result.buttons(ui, |ui| {
                modal_result.button(ui, "ok");
            });
        });

        while let Ok(outcome) = self.clear_rx.try_recv() {
            self.clear_message = outcome.clear_message();
            modal_result.open();
        }

        let modal_confirm = Modal::new(ctx, "clear_confirm");
        modal_confirm.show(|ui| {
            modal_confirm.title(ui, "Clear Data");
            modal_confirm.frame(ui, |ui| {
                modal_confirm.body(ui, CLEAR_PROMPT);
            });
            modal_confirm.buttons(ui, |ui| {
                if modal_confirm.button(ui, "cancel").clicked() {
                    self.clear(ctx, Confirmation::Declined);
                }
                if modal_confirm.caution_button(ui, "🗑 delete").clicked() {
                    self.clear(ctx, Confirmation::Accepted);
                }
            });
        });

        egui::SidePanel::left("left_panel").show(ctx, |ui| {
            self.readings(ui);

            ui.heading("Orientation");
            ui.horizontal_wrapped(|ui| {
                for (id, label) in RESET_CONTROLS {
                    if ui.button(label).clicked() {
                        self.reset(id);
                    }
                }
            });
            ui.separator();

            ui.heading("Data");
            if ui.button("🗑 Clear data").clicked() {
                modal_confirm.open();
            }
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let size = ui.available_size();
                if size.x <= 0.0 || size.y <= 0.0 {
                    return;
                }

                let viewport = self.viewport.get_or_insert_with(|| Viewport::new(size));
                if viewport.renderer().size() != size {
                    viewport.on_resize(size);
                    log::trace!(
                        "viewport resized to {}x{}, aspect {:.3}",
                        size.x,
                        size.y,
                        viewport.camera().aspect()
                    );
                }

                self.dashboard.update_viewport(viewport);
                viewport.show(ui);
            });
    }
}
