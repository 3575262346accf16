use crate::app::lib;
use crate::app::App;
use eframe::egui;
use lib::types::MINING_LOG_FIELDS;

use super::table::show_rows;

#[derive(Default)]
pub struct Miner {
    miner_public_key: String,
}

impl Miner {
    pub fn show(&mut self, app: &mut App, ui: &mut egui::Ui) {
        ui.heading("Mine");
        ui.separator();
        let difficulty = app.difficulty();
        ui.label("Difficulty: ");
        ui.monospace(format!("{difficulty}"));
        ui.horizontal(|ui| {
            if ui
                .add_enabled(app.wallet.is_some(), egui::Button::new("use wallet key"))
                .clicked()
            {
                if let Some(keys) = &app.wallet {
                    self.miner_public_key = keys.public_key.clone();
                }
            }
            ui.add(
                egui::TextEdit::singleline(&mut self.miner_public_key)
                    .hint_text("miner public key")
                    .font(egui::TextStyle::Monospace),
            );
        });
        let session = app.session();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    !self.miner_public_key.is_empty(),
                    egui::Button::new("mine"),
                )
                .clicked()
            {
                app.start_mining(self.miner_public_key.clone());
            }
            if ui
                .add_enabled(session.is_running(), egui::Button::new("stop"))
                .clicked()
            {
                app.stop_mining();
            }
        });
        ui.monospace(app.status.as_str());
        ui.monospace(session.status_line());
        ui.separator();
        let (accepted, rows): (Vec<bool>, Vec<_>) = app.mining_log_rows().into_iter().unzip();
        show_rows(ui, "mining_log", &MINING_LOG_FIELDS, &rows, |index| {
            let color = if accepted[index] {
                egui::Color32::GREEN
            } else {
                egui::Color32::RED
            };
            Some(color)
        });
    }
}
