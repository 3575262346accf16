use crate::app::lib;
use crate::app::App;
use eframe::egui;
use lib::{filter::ChainFilter, types::BLOCK_FIELDS};

use super::table::show_rows;

#[derive(Default)]
pub struct BlockExplorer {
    block_uuid: String,
    miner_key: String,
    block_index: String,
}

impl BlockExplorer {
    pub fn show(&mut self, app: &mut App, ui: &mut egui::Ui) {
        ui.heading("Chain");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.block_uuid).hint_text("block uuid"));
            ui.add(egui::TextEdit::singleline(&mut self.miner_key).hint_text("miner key"));
            ui.add(egui::TextEdit::singleline(&mut self.block_index).hint_text("block index"));
            if ui.button("search").clicked() {
                let filter =
                    ChainFilter::from_inputs(&self.block_uuid, &self.miner_key, &self.block_index);
                app.refresh_chain(&filter);
            }
            if ui.button("clear").clicked() {
                *self = Self::default();
                app.refresh_chain(&ChainFilter::default());
            }
        });
        ui.separator();
        let rows = app.chain_rows();
        if rows.is_empty() {
            ui.label("No blocks");
            return;
        }
        show_rows(ui, "blocks", &BLOCK_FIELDS, &rows, |_| None);
    }
}
