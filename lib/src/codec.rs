use base64::Engine as _;

/// Decode a base64 block payload as delivered by the chain server.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, Error> {
    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Nonces go on the wire, and into the hash, as decimal ascii.
pub fn encode_nonce(nonce: u64) -> String {
    nonce.to_string()
}

/// `miner_public_key ‖ decode(payload)`, the bytes every nonce is appended to.
pub fn mining_prefix(miner_public_key: &str, payload: &str) -> Result<Vec<u8>, Error> {
    let payload = decode_payload(payload)?;
    Ok(concat(&[miner_public_key.as_bytes(), &payload]))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid base64 payload")]
    Base64(#[from] base64::DecodeError),
}
