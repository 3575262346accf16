use crate::app::lib;
use crate::app::App;
use eframe::egui;
use lib::types::TransactionRequest;

#[derive(Default)]
pub struct TransactionBuilder {
    request: TransactionRequest,
}

impl TransactionBuilder {
    pub fn show(&mut self, app: &mut App, ui: &mut egui::Ui) {
        ui.heading("Make transaction");
        ui.separator();
        if ui
            .add_enabled(app.wallet.is_some(), egui::Button::new("use wallet keys"))
            .clicked()
        {
            if let Some(keys) = &app.wallet {
                self.request.sender_private_key = keys.private_key.clone();
                self.request.sender_public_key = keys.public_key.clone();
            }
        }
        let fields = [
            ("sender private key", &mut self.request.sender_private_key),
            ("sender public key", &mut self.request.sender_public_key),
            ("recipient public key", &mut self.request.recipient_public_key),
            ("amount", &mut self.request.amount),
        ];
        for (hint, value) in fields {
            ui.add(
                egui::TextEdit::singleline(value)
                    .hint_text(hint)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(f32::INFINITY),
            );
        }
        ui.horizontal(|ui| {
            if ui.button("sign").clicked() {
                app.sign_transaction(&self.request);
            }
            if ui
                .add_enabled(
                    app.signed_transaction.is_some(),
                    egui::Button::new("broadcast"),
                )
                .clicked()
                && app.broadcast_transaction().is_ok()
            {
                self.request = TransactionRequest::default();
            }
        });
        if let Some(transaction) = &app.signed_transaction {
            ui.separator();
            ui.label("Signed transaction: ");
            let text = lib::serde_json::to_string_pretty(transaction).unwrap_or_default();
            ui.monospace(text);
        }
    }
}
