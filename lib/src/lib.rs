pub mod client;
pub mod codec;
pub mod filter;
pub mod miner;
pub mod pow;
pub mod session;
pub mod table;
pub mod types;

pub use rand;
pub use serde_json;
