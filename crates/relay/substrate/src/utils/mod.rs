//! Utility modules for Substrate integration.
//!
//! ## Modules
//!
//! - [`conversion`]: Hash, address, call-parameter and event-field conversions

pub mod conversion;

pub use conversion::{
    account_to_ss58, block_hash_to_h256, composite_to_fields, h256_to_block_hash, h256_to_tx_hash,
    hex_param_to_value, scale_to_event_value,
};
