//! Utility functions for identifier encoding

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32m
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    encode_bech32(hrp, uuid7().as_bytes())
}

pub fn encode_bech32(hrp: &str, data: &[u8]) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, data)?;
    Ok(encode)
}

/// Decodes a bech32 string into its prefix and data part.
pub fn decode_bech32(encoded: &str) -> anyhow::Result<(String, Vec<u8>)> {
    let (hrp, data) = bech32::decode(encoded)?;
    Ok((hrp.to_string().to_ascii_lowercase(), data))
}
