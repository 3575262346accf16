use serde::{Deserialize, Serialize};

mod types;

pub use types::*;

pub const TRANSACTION_FIELDS: [&str; 4] = [
    "uuid",
    "sender_public_key",
    "recipient_public_key",
    "amount",
];

pub const BLOCK_FIELDS: [&str; 7] = [
    "index",
    "uuid",
    "hash",
    "previous_hash",
    "proof_of_work",
    "miner_key",
    "transactions",
];

pub const MINING_LOG_FIELDS: [&str; 4] = ["block", "nonce", "result", "message"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningOutcome {
    Accepted { server_message: String },
    Rejected { status_code: u16, server_message: String },
}

/// One line of the mining log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningLogEntry {
    pub block: String,
    pub nonce: Option<u64>,
    pub result: MiningResult,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiningResult {
    Accepted,
    Rejected,
}

impl MiningLogEntry {
    pub fn is_accepted(&self) -> bool {
        self.result == MiningResult::Accepted
    }

    /// The entry as a table record with [`MINING_LOG_FIELDS`].
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!({
            "block": self.block,
            "nonce": self.nonce.map(|nonce| nonce.to_string()).unwrap_or_default(),
            "result": self.result,
            "message": self.message,
        })
    }
}
