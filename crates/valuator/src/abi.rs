//! Minimal Solidity ABI encoding for view calls
//!
//! Only what the curve and pool reads need: selectors, address arguments and
//! static `uint256`/`address` return words.

use qacc_types::{ValuationError, ValuationResult};
use sha3::{Digest, Keccak256};

/// Size of one ABI word
pub const WORD_SIZE: usize = 32;

/// First four bytes of the Keccak-256 hash of a function signature
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `signature` with address arguments
pub fn encode_call(signature: &str, address_args: &[&str]) -> ValuationResult<Vec<u8>> {
    let mut data = Vec::with_capacity(4 + WORD_SIZE * address_args.len());
    data.extend_from_slice(&function_selector(signature));
    for address in address_args {
        data.extend_from_slice(&encode_address(address)?);
    }
    Ok(data)
}

/// Left-pad a 20-byte address into an ABI word
pub fn encode_address(address: &str) -> ValuationResult<[u8; WORD_SIZE]> {
    if !is_hex_address(address) {
        return Err(ValuationError::invalid_parameter(
            "address",
            address,
            "0x-prefixed 20-byte hex",
        ));
    }
    let bytes =
        hex::decode(&address[2..]).map_err(|e| ValuationError::decode("address", &e.to_string()))?;

    let mut word = [0u8; WORD_SIZE];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

/// Decode the `index`-th return word as an unsigned integer.
///
/// Fails when the value does not fit in 128 bits.
pub fn decode_uint(data: &[u8], index: usize) -> ValuationResult<u128> {
    let word = word_at(data, index)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ValuationError::decode("uint256", "value exceeds 128 bits"));
    }

    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Decode the `index`-th return word as a lowercase hex address
pub fn decode_address(data: &[u8], index: usize) -> ValuationResult<String> {
    let word = word_at(data, index)?;
    Ok(format!("0x{}", hex::encode(&word[12..])))
}

fn word_at(data: &[u8], index: usize) -> ValuationResult<&[u8]> {
    let start = index * WORD_SIZE;
    data.get(start..start + WORD_SIZE).ok_or_else(|| {
        ValuationError::decode(
            "abi word",
            &format!("need {} bytes, got {}", start + WORD_SIZE, data.len()),
        )
    })
}

/// `0x`-prefixed 40 hex digit string
pub fn is_hex_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Hex-encode bytes for JSON-RPC
pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode JSON-RPC hex data
pub fn from_hex_data(value: &str) -> ValuationResult<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| ValuationError::decode("hex data", &e.to_string()))
}

/// Parse a JSON-RPC hex quantity such as a block number
pub fn parse_quantity(value: &str) -> ValuationResult<u64> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u64::from_str_radix(digits, 16)
        .map_err(|e| ValuationError::decode("hex quantity", &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        assert_eq!(function_selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(function_selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_encode_call_with_addresses() {
        let data = encode_call(
            "poolByPair(address,address)",
            &[
                "0x00000000000000000000000000000000000000aa",
                "0x00000000000000000000000000000000000000BB",
            ],
        )
        .unwrap();

        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[4 + 31], 0xaa);
        assert_eq!(data[4 + 63], 0xbb);
        assert!(data[4..4 + 31].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_rejects_bad_address() {
        assert!(encode_address("0x1234").is_err());
        assert!(encode_address("1111111111111111111111111111111111111111").is_err());
        assert!(!is_hex_address("0xzz11111111111111111111111111111111111111"));
    }

    #[test]
    fn test_decode_uint() {
        let mut data = vec![0u8; 64];
        data[31] = 0x2a;
        data[63] = 0x01;
        data[62] = 0x00;

        assert_eq!(decode_uint(&data, 0).unwrap(), 42);
        assert_eq!(decode_uint(&data, 1).unwrap(), 1);
        assert!(decode_uint(&data, 2).is_err());

        data[0] = 1;
        assert!(decode_uint(&data, 0).is_err());
    }

    #[test]
    fn test_decode_address() {
        let mut data = vec![0u8; 32];
        data[12] = 0xde;
        data[31] = 0xef;
        assert_eq!(decode_address(&data, 0).unwrap(), "0xde000000000000000000000000000000000000ef");
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex_data(&[0x01, 0xff]), "0x01ff");
        assert_eq!(from_hex_data("0x01ff").unwrap(), vec![0x01, 0xff]);
        assert_eq!(parse_quantity("0x10").unwrap(), 16);
        assert!(from_hex_data("0xzz").is_err());
    }
}
