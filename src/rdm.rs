//! RDM framing helpers
//!
//! Checksums, message validation and the discovery response encoding. These
//! work on raw byte slices as returned by
//! [`DmxPorts::rdm_receive`](crate::DmxPorts::rdm_receive) and as passed to
//! [`DmxPorts::rdm_send_raw`](crate::DmxPorts::rdm_send_raw). Command
//! semantics are left to the application.
//!
//! # Discovery Response Layout
//!
//! ```text
//! FE FE FE FE FE FE FE AA | EUID (12 bytes) | ECS (4 bytes)
//! ```
//!
//! Each UID and checksum byte `b` is sent as the pair `b | 0xAA`, `b | 0x55`;
//! ANDing the pair recovers it. Responders may shorten the preamble.

use crate::constants::{
    RDM_CHECKSUM_SIZE, RDM_DISCOVERY_ECS_SIZE, RDM_DISCOVERY_EUID_SIZE, RDM_DISCOVERY_PREAMBLE,
    RDM_DISCOVERY_PREAMBLE_MAX, RDM_DISCOVERY_RESPONSE_SIZE, RDM_DISCOVERY_SEPARATOR,
    RDM_MESSAGE_LENGTH_OFFSET, RDM_MIN_MESSAGE_LENGTH, RDM_START_CODE, RDM_SUB_START_CODE,
    RDM_UID_SIZE,
};

/// Wrapping 16-bit sum of `bytes`
#[must_use]
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte)))
}

/// Check start codes, length field and trailing checksum of a message.
///
/// `bytes` must hold exactly the message and its checksum, with the start
/// code first.
#[must_use]
pub fn is_valid_message(bytes: &[u8]) -> bool {
    let Some(&length) = bytes.get(RDM_MESSAGE_LENGTH_OFFSET) else {
        return false;
    };
    let length = usize::from(length);

    if bytes[0] != RDM_START_CODE
        || bytes[1] != RDM_SUB_START_CODE
        || length < RDM_MIN_MESSAGE_LENGTH
        || bytes.len() != length + RDM_CHECKSUM_SIZE
    {
        return false;
    }

    let expected = u16::from_be_bytes([bytes[length], bytes[length + 1]]);
    checksum(&bytes[..length]) == expected
}

/// Write the checksum of `out[..message_len]` right after it.
///
/// Returns the total length written, or `None` if `out` is too small.
pub fn append_checksum(out: &mut [u8], message_len: usize) -> Option<usize> {
    let total = message_len.checked_add(RDM_CHECKSUM_SIZE)?;
    if out.len() < total {
        return None;
    }
    let sum = checksum(&out[..message_len]);
    out[message_len..total].copy_from_slice(&sum.to_be_bytes());
    Some(total)
}

#[inline]
const fn encode_pair(byte: u8) -> [u8; 2] {
    [byte | 0xAA, byte | 0x55]
}

#[inline]
const fn decode_pair(pair: [u8; 2]) -> u8 {
    pair[0] & pair[1]
}

/// Encode the discovery response a responder with `uid` would send
#[must_use]
pub fn encode_discovery_response(uid: &[u8; RDM_UID_SIZE]) -> [u8; RDM_DISCOVERY_RESPONSE_SIZE] {
    let mut out = [RDM_DISCOVERY_PREAMBLE; RDM_DISCOVERY_RESPONSE_SIZE];
    out[RDM_DISCOVERY_PREAMBLE_MAX] = RDM_DISCOVERY_SEPARATOR;

    let euid_start = RDM_DISCOVERY_PREAMBLE_MAX + 1;
    let euid = &mut out[euid_start..euid_start + RDM_DISCOVERY_EUID_SIZE];
    for (chunk, &byte) in euid.chunks_exact_mut(2).zip(uid) {
        chunk.copy_from_slice(&encode_pair(byte));
    }

    let [high, low] = checksum(&out[euid_start..euid_start + RDM_DISCOVERY_EUID_SIZE]).to_be_bytes();
    let ecs_start = euid_start + RDM_DISCOVERY_EUID_SIZE;
    out[ecs_start..ecs_start + 2].copy_from_slice(&encode_pair(high));
    out[ecs_start + 2..ecs_start + RDM_DISCOVERY_ECS_SIZE].copy_from_slice(&encode_pair(low));

    out
}

/// Recover the UID from a discovery response.
///
/// Returns `None` when the separator is missing, the response is truncated or
/// the encoded checksum does not match.
#[must_use]
pub fn decode_discovery_response(bytes: &[u8]) -> Option<[u8; RDM_UID_SIZE]> {
    let separator = bytes
        .iter()
        .take(RDM_DISCOVERY_PREAMBLE_MAX + 1)
        .position(|&b| b != RDM_DISCOVERY_PREAMBLE)?;
    if bytes[separator] != RDM_DISCOVERY_SEPARATOR {
        return None;
    }

    let body = bytes.get(separator + 1..separator + 1 + RDM_DISCOVERY_EUID_SIZE + RDM_DISCOVERY_ECS_SIZE)?;
    let (euid, ecs) = body.split_at(RDM_DISCOVERY_EUID_SIZE);

    let mut uid = [0u8; RDM_UID_SIZE];
    for (byte, pair) in uid.iter_mut().zip(euid.chunks_exact(2)) {
        *byte = decode_pair([pair[0], pair[1]]);
    }

    let expected = u16::from_be_bytes([decode_pair([ecs[0], ecs[1]]), decode_pair([ecs[2], ecs[3]])]);
    (checksum(euid) == expected).then_some(uid)
}
