use serde::{Deserialize, Serialize};

/// An unmined block as handed out by the chain server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCandidate {
    // Base64 encoded.
    #[serde(rename = "block")]
    pub payload: String,
    #[serde(rename = "uuid")]
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub blocks: Vec<BlockCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningSubmission {
    #[serde(rename = "uuid")]
    pub block_id: String,
    #[serde(rename = "proof_of_work")]
    pub nonce: String,
    pub miner_public_key: String,
}

/// Chain explorer response. Blocks stay loosely typed so the explorer can
/// show whatever fields the server sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub blocks: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletKeys {
    pub private_key: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub sender_private_key: String,
    pub sender_public_key: String,
    pub recipient_public_key: String,
    pub amount: String,
}
