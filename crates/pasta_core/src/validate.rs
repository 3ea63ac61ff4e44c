//! Payload validation rules applied before any identifier or storage work.

use crate::error::ValidationError;

/// Whether `content` carries no data: zero length or every byte is `0x00`.
pub fn is_semantically_empty(content: &[u8]) -> bool {
    content.iter().all(|&b| b == 0)
}

/// Validate a paste payload.
///
/// # Arguments
/// - `content`: Raw payload bytes.
/// - `max_bytes`: Largest accepted payload length.
///
/// # Errors
/// [`ValidationError::Empty`] for empty or all-null payloads,
/// [`ValidationError::TooLarge`] when `content` exceeds `max_bytes`.
pub fn validate_payload(content: &[u8], max_bytes: usize) -> Result<(), ValidationError> {
    if content.len() > max_bytes {
        return Err(ValidationError::TooLarge {
            actual: content.len(),
            limit: max_bytes,
        });
    }
    if is_semantically_empty(content) {
        return Err(ValidationError::Empty);
    }
    Ok(())
}
