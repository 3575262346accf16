use crate::app::lib;
use crate::app::App;
use eframe::egui;
use lib::types::TRANSACTION_FIELDS;

use super::table::show_rows;

pub struct MemPoolExplorer;

impl MemPoolExplorer {
    pub fn show(&mut self, app: &mut App, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Pending transactions");
            if ui.button("refresh").clicked() {
                app.refresh_transactions();
            }
        });
        ui.separator();
        let rows = app.transaction_rows();
        if rows.is_empty() {
            ui.label("No pending transactions");
            return;
        }
        show_rows(ui, "transactions", &TRANSACTION_FIELDS, &rows, |_| None);
    }
}
