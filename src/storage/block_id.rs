//! Deterministic block identifiers.
//!
//! The store requires opaque, equal-significance block IDs; encoding the
//! zero-padded decimal sequence keeps them lexicographically sortable by
//! sequence before encoding and unambiguous to decode.

use crate::defaults;
use crate::error::{PipelineError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

const PREFIX: &str = "block-";

/// Encodes a block sequence number into its store-facing ID.
pub fn encode(sequence: u32) -> String {
    STANDARD.encode(format!(
        "{PREFIX}{sequence:0width$}",
        width = defaults::BLOCK_ID_PAD
    ))
}

/// Decodes a block ID back to its sequence number.
pub fn decode(id: &str) -> Result<u32> {
    let raw = STANDARD
        .decode(id)
        .map_err(|e| PipelineError::Upload {
            message: format!("block ID is not valid base64: {e}"),
        })?;
    let text = String::from_utf8(raw).map_err(|_| PipelineError::Upload {
        message: "block ID does not decode to text".to_string(),
    })?;
    let digits = text.strip_prefix(PREFIX).ok_or_else(|| PipelineError::Upload {
        message: format!("block ID has unexpected layout: {text}"),
    })?;
    digits.parse().map_err(|_| PipelineError::Upload {
        message: format!("block ID has a non-numeric sequence: {text}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn encode_is_injective_over_a_range() {
        let ids: HashSet<String> = (0..2000).map(encode).collect();
        assert_eq!(ids.len(), 2000);
    }

    #[test]
    fn decode_inverts_encode() {
        for sequence in [0, 1, 99, 12345, 99999, 100000, u32::MAX] {
            assert_eq!(decode(&encode(sequence)).unwrap(), sequence);
        }
    }

    #[test]
    fn pre_encoding_ids_sort_by_sequence() {
        // The padded decimal form sorts lexicographically in sequence
        // order for all sequences of equal width.
        let a = format!("{PREFIX}{:05}", 7);
        let b = format!("{PREFIX}{:05}", 31);
        assert!(a < b);
    }

    #[test]
    fn decode_rejects_foreign_ids() {
        assert!(decode("not-base64!").is_err());
        let alien = STANDARD.encode("chunk-00001");
        assert!(decode(&alien).is_err());
        let non_numeric = STANDARD.encode("block-abcde");
        assert!(decode(&non_numeric).is_err());
    }
}
