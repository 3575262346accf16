use crate::app::lib;
use eframe::egui;
use lib::table::DisplayRow;

/// Draw rendered rows as a striped grid. Full values show on hover and each
/// row gets a button that copies its export JSON to the clipboard.
pub fn show_rows(
    ui: &mut egui::Ui,
    id: &str,
    fields: &[&str],
    rows: &[DisplayRow],
    color: impl Fn(usize) -> Option<egui::Color32>,
) {
    egui::ScrollArea::both().id_source(id).show(ui, |ui| {
        egui::Grid::new(id).striped(true).show(ui, |ui| {
            for field in fields {
                ui.monospace(*field);
            }
            ui.end_row();
            for (index, row) in rows.iter().enumerate() {
                for cell in &row.cells {
                    let mut text = egui::RichText::new(&cell.display_value).monospace();
                    if let Some(color) = color(index) {
                        text = text.color(color);
                    }
                    ui.label(text).on_hover_text(&cell.full_value);
                }
                if ui.button("copy").clicked() {
                    if let Ok(json) = row.export_json() {
                        ui.output_mut(|output| output.copied_text = json);
                    }
                }
                ui.end_row();
            }
        });
    });
}
