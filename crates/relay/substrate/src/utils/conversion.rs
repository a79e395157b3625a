//! Conversions between relay types and subxt types.
//!
//! ## Conversion Categories
//!
//! 1. **Hashes**: BlockHash/TransactionHash ↔ H256
//! 2. **Addresses**: AccountId32 → SS58 string with a chosen prefix
//! 3. **Call parameters**: hex strings → dynamic byte values
//! 4. **Event fields**: decoded scale values → EventValue

use proof_relay_core::{BlockHash, EventField, EventValue, TransactionHash, TransportError};
use sp_core::crypto::{Ss58AddressFormat, Ss58Codec};
use subxt::ext::scale_value::{Composite, Primitive, Value, ValueDef};
use subxt::utils::{AccountId32, H256};

// ============================================================================
// Hashes
// ============================================================================

/// Convert a relay block hash into a 32-byte substrate hash.
pub fn block_hash_to_h256(hash: &BlockHash) -> Result<H256, TransportError> {
    let bytes: [u8; 32] = hash.as_bytes().try_into().map_err(|_| {
        TransportError::SerializationError(format!(
            "Block hash must be 32 bytes, got {}",
            hash.as_bytes().len()
        ))
    })?;
    Ok(H256(bytes))
}

pub fn h256_to_block_hash(hash: H256) -> BlockHash {
    BlockHash::from_bytes(hash.0.to_vec())
}

pub fn h256_to_tx_hash(hash: H256) -> TransactionHash {
    TransactionHash::from_bytes(hash.0.to_vec())
}

// ============================================================================
// Addresses
// ============================================================================

/// Render an account in SS58 form under `prefix`.
///
/// subxt's own `Display` always uses the generic prefix 42.
pub fn account_to_ss58(account: &AccountId32, prefix: u16) -> String {
    sp_core::crypto::AccountId32::from(account.0)
        .to_ss58check_with_version(Ss58AddressFormat::custom(prefix))
}

// ============================================================================
// Call Parameters
// ============================================================================

/// Decode a hex call parameter into a byte-vector value.
///
/// The chain call takes raw bytes; the hex form only exists in the call
/// description.
pub fn hex_param_to_value(name: &str, hex_value: &str) -> Result<Value, TransportError> {
    let bytes = hex::decode(hex_value).map_err(|e| {
        TransportError::SerializationError(format!("Parameter `{}` is not valid hex: {}", name, e))
    })?;
    Ok(Value::from_bytes(bytes))
}

// ============================================================================
// Event Fields
// ============================================================================

/// Convert a decoded field value.
pub fn scale_to_event_value<T>(value: &Value<T>) -> EventValue {
    match &value.value {
        ValueDef::Primitive(Primitive::Bool(b)) => EventValue::Bool(*b),
        ValueDef::Primitive(Primitive::U128(n)) => EventValue::Uint(*n),
        ValueDef::Primitive(Primitive::String(s)) => EventValue::Text(s.clone()),
        // Single-field newtype wrappers decode as a one-element composite
        ValueDef::Composite(Composite::Unnamed(inner)) if inner.len() == 1 => {
            scale_to_event_value(&inner[0])
        }
        _ => EventValue::Other(value.to_string()),
    }
}

/// Convert an event's decoded fields, keeping names where the event has them.
pub fn composite_to_fields<T>(composite: &Composite<T>) -> Vec<EventField> {
    match composite {
        Composite::Named(fields) => fields
            .iter()
            .map(|(name, value)| EventField {
                name: Some(name.clone()),
                value: scale_to_event_value(value),
            })
            .collect(),
        Composite::Unnamed(values) => values
            .iter()
            .map(|value| EventField {
                name: None,
                value: scale_to_event_value(value),
            })
            .collect(),
    }
}
