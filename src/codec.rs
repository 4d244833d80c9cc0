//! Binary record codec.
//!
//! Every record is a 4-byte signed integer stored in big-endian byte order.
//! Files carry no header, length prefix or separators, so a file of *n* records
//! is exactly `4 * n` bytes long.

/// Size of a single encoded record in bytes.
pub const RECORD_SIZE: usize = 4;

/// Encodes a value into its binary form.
pub fn encode(value: i32) -> [u8; RECORD_SIZE] {
    value.to_be_bytes()
}

/// Decodes a value from its binary form.
pub fn decode(bytes: [u8; RECORD_SIZE]) -> i32 {
    i32::from_be_bytes(bytes)
}

/// Encodes a sequence of values into one contiguous byte buffer
/// so that a whole block can be persisted with a single write.
pub fn encode_sequence(values: &[i32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * RECORD_SIZE);
    for value in values {
        bytes.extend_from_slice(&encode(*value));
    }

    return bytes;
}
