use std::time::Duration;

use crate::app::App;
use eframe::egui;

mod block_explorer;
mod mempool_explorer;
mod miner;
mod table;
mod transaction;
mod wallet;

use block_explorer::BlockExplorer;
use mempool_explorer::MemPoolExplorer;
use miner::Miner;
use transaction::TransactionBuilder;
use wallet::Wallet;

const REPAINT_INTERVAL: Duration = Duration::from_millis(200);

pub struct EguiApp {
    app: App,
    wallet: Wallet,
    transaction_builder: TransactionBuilder,
    mempool_explorer: MemPoolExplorer,
    miner: Miner,
    block_explorer: BlockExplorer,
    tab: Tab,
}

#[derive(Eq, PartialEq)]
enum Tab {
    Wallet,
    TransactionBuilder,
    MemPoolExplorer,
    Miner,
    BlockExplorer,
}

impl EguiApp {
    pub fn new(app: App, _cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            app,
            wallet: Wallet,
            transaction_builder: TransactionBuilder::default(),
            mempool_explorer: MemPoolExplorer,
            miner: Miner::default(),
            block_explorer: BlockExplorer::default(),
            tab: Tab::Wallet,
        }
    }
}

impl eframe::App for EguiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.app.poll_miner();
        // The mining task reports asynchronously, keep polling for it.
        ctx.request_repaint_after(REPAINT_INTERVAL);

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Wallet, "wallet");
                ui.selectable_value(
                    &mut self.tab,
                    Tab::TransactionBuilder,
                    "make transaction",
                );
                ui.selectable_value(
                    &mut self.tab,
                    Tab::MemPoolExplorer,
                    "pending transactions",
                );
                ui.selectable_value(&mut self.tab, Tab::Miner, "mine");
                ui.selectable_value(&mut self.tab, Tab::BlockExplorer, "chain explorer");
            });
        });
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let session = self.app.session();
            ui.horizontal(|ui| {
                ui.monospace(self.app.status.as_str());
                ui.separator();
                ui.monospace(session.status_line());
            });
            let mut dismissed = None;
            for (index, alert) in self.app.alerts.iter().enumerate() {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::YELLOW, alert.as_str());
                    if ui.small_button("×").clicked() {
                        dismissed = Some(index);
                    }
                });
            }
            if let Some(index) = dismissed {
                self.app.alerts.remove(index);
            }
        });
        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Wallet => self.wallet.show(&mut self.app, ui),
            Tab::TransactionBuilder => self.transaction_builder.show(&mut self.app, ui),
            Tab::MemPoolExplorer => self.mempool_explorer.show(&mut self.app, ui),
            Tab::Miner => self.miner.show(&mut self.app, ui),
            Tab::BlockExplorer => self.block_explorer.show(&mut self.app, ui),
        });
    }
}
