use crate::app::App;
use eframe::egui;

pub struct Wallet;

impl Wallet {
    pub fn show(&mut self, app: &mut App, ui: &mut egui::Ui) {
        ui.heading("Wallet");
        ui.separator();
        if ui.button("generate").clicked() {
            app.generate_wallet();
        }
        if let Some(keys) = &app.wallet {
            ui.label("Private key: ");
            key_field(ui, &keys.private_key);
            ui.label("Public key: ");
            key_field(ui, &keys.public_key);
        }
    }
}

fn key_field(ui: &mut egui::Ui, key: &str) {
    ui.horizontal(|ui| {
        let mut text = key;
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .font(egui::TextStyle::Monospace)
                .desired_width(f32::INFINITY),
        );
    });
    if ui.small_button("copy").clicked() {
        ui.output_mut(|output| output.copied_text = key.into());
    }
}
