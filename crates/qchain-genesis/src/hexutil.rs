use primitive_types::U256;
use qchain_core::error::{ChainError, ChainResult};

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> ChainResult<Vec<u8>> {
    let s = strip_0x(s);
    let padded;
    let s = if s.len() % 2 == 1 {
        padded = format!("0{s}");
        padded.as_str()
    } else {
        s
    };
    hex::decode(s).map_err(ChainError::InvalidHex)
}

pub fn parse_hex_u64(s: &str) -> ChainResult<u64> {
    u64::from_str_radix(strip_0x(s), 16)
        .map_err(|e| ChainError::MalformedInput(format!("invalid u64 hex '{s}': {e}")))
}

pub fn parse_hex_u256(s: &str) -> ChainResult<U256> {
    let bytes = parse_hex_bytes(s)?;
    if bytes.len() > 32 {
        return Err(ChainError::MalformedInput(format!(
            "hex value '{s}' exceeds 32 bytes"
        )));
    }
    Ok(U256::from_big_endian(&bytes))
}
