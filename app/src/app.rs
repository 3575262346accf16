use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::cli::Config;

pub use toychain as lib;
use lib::{
    client::{self, ChainService, HttpChainService},
    filter::ChainFilter,
    miner::{self, Miner, MinerConfig, MiningEvent, Notice, RejectionClassifier},
    rand::{rngs::StdRng, SeedableRng},
    serde_json::Value,
    session::MiningSession,
    table::{self, DisplayRow},
    types::{
        MiningLogEntry, TransactionRequest, WalletKeys, BLOCK_FIELDS, MINING_LOG_FIELDS,
        TRANSACTION_FIELDS,
    },
};

pub struct App {
    pub trim_length: usize,
    pub status: String,
    pub alerts: Vec<String>,
    pub wallet: Option<WalletKeys>,
    pub signed_transaction: Option<Value>,
    pub transactions: Vec<Value>,
    pub chain: Vec<Value>,
    pub mining_log: Vec<MiningLogEntry>,
    service: Arc<HttpChainService>,
    miner: Miner,
    notices: mpsc::UnboundedReceiver<Notice>,
    runtime: tokio::runtime::Runtime,
}

impl App {
    pub fn new(config: &Config) -> Result<Self, Error> {
        // Mining runs as a task on this runtime while the GUI owns the main thread.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let service = Arc::new(HttpChainService::new(&config.server)?);
        let difficulty = match runtime.block_on(service.fetch_difficulty()) {
            Ok(difficulty) => difficulty,
            Err(err) => {
                warn!(%err, default = miner::DEFAULT_DIFFICULTY, "could not read mining difficulty");
                miner::DEFAULT_DIFFICULTY
            }
        };
        let miner_config = MinerConfig {
            classifier: RejectionClassifier::new(config.recoverable_status.iter().copied()),
            cooldown: config.cooldown,
            idle_notice_delay: config.idle_notice_delay,
            max_nonce: config.max_nonce,
            ..MinerConfig::new(difficulty)
        };
        let (miner, notices) = Miner::new(service.clone(), miner_config);
        let mut app = Self {
            trim_length: config.trim_length,
            status: miner::NOT_MINING.into(),
            alerts: vec![],
            wallet: None,
            signed_transaction: None,
            transactions: vec![],
            chain: vec![],
            mining_log: vec![],
            service,
            miner,
            notices,
            runtime,
        };
        app.refresh_transactions();
        app.refresh_chain(&ChainFilter::default());
        Ok(app)
    }

    pub fn difficulty(&self) -> u32 {
        self.miner.config().difficulty
    }

    pub fn session(&self) -> MiningSession {
        self.miner.session()
    }

    pub fn start_mining(&mut self, miner_public_key: String) {
        let _guard = self.runtime.enter();
        self.status = "mining".into();
        self.miner.start(miner_public_key, StdRng::from_entropy());
    }

    pub fn stop_mining(&mut self) {
        self.miner.stop();
    }

    /// Apply everything the mining task reported since the last frame.
    pub fn poll_miner(&mut self) {
        while let Ok(notice) = self.notices.try_recv() {
            if !self.miner.is_current(&notice) {
                continue;
            }
            match notice.event {
                MiningEvent::Status(status) => self.status = status,
                MiningEvent::Log(entry) => self.mining_log.push(entry),
                MiningEvent::RefreshTransactions => self.refresh_transactions(),
            }
        }
    }

    pub fn refresh_transactions(&mut self) {
        match self.runtime.block_on(self.service.fetch_transactions()) {
            Ok(transactions) => self.transactions = transactions,
            Err(err) => self.alert("could not load transactions", &err),
        }
    }

    pub fn refresh_chain(&mut self, filter: &ChainFilter) {
        let query = filter.build_query();
        match self.runtime.block_on(self.service.fetch_chain(&query)) {
            Ok(blocks) => self.chain = blocks,
            Err(err) => self.alert("could not load the chain", &err),
        }
    }

    pub fn generate_wallet(&mut self) {
        match self.runtime.block_on(self.service.generate_wallet()) {
            Ok(keys) => self.wallet = Some(keys),
            Err(err) => self.alert("bad request", &err),
        }
    }

    pub fn sign_transaction(&mut self, request: &TransactionRequest) {
        match self.runtime.block_on(self.service.sign_transaction(request)) {
            Ok(transaction) => self.signed_transaction = Some(transaction),
            Err(err) => self.alert("bad request", &err),
        }
    }

    pub fn broadcast_transaction(&mut self) -> Result<(), Error> {
        let transaction = self
            .signed_transaction
            .take()
            .ok_or(Error::NothingToBroadcast)?;
        match self
            .runtime
            .block_on(self.service.broadcast_transaction(&transaction))
        {
            Ok(message) => {
                self.alerts.push(message);
                self.refresh_transactions();
                Ok(())
            }
            Err(err) => {
                self.signed_transaction = Some(transaction);
                self.alert("bad request", &err);
                Err(err.into())
            }
        }
    }

    pub fn transaction_rows(&self) -> Vec<DisplayRow> {
        table::render(&self.transactions, &TRANSACTION_FIELDS, self.trim_length)
    }

    pub fn chain_rows(&self) -> Vec<DisplayRow> {
        table::render(&self.chain, &BLOCK_FIELDS, self.trim_length)
    }

    pub fn mining_log_rows(&self) -> Vec<(bool, DisplayRow)> {
        self.mining_log
            .iter()
            .filter_map(|entry| {
                table::render_row(&entry.to_record(), &MINING_LOG_FIELDS, self.trim_length)
                    .ok()
                    .map(|row| (entry.is_accepted(), row))
            })
            .collect()
    }

    fn alert(&mut self, context: &str, err: &client::Error) {
        warn!(%err, "{context}");
        self.alerts.push(format!("{context}: {err}"));
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("chain service error")]
    Client(#[from] client::Error),
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("no signed transaction to broadcast")]
    NothingToBroadcast,
}
