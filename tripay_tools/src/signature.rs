//! HMAC-SHA256 signatures for the Tripay gateway.
//!
//! Two signatures are in play, and both are keyed with the merchant's private key:
//!
//! * Transaction signatures, over the plain concatenation `merchant_code ‖ merchant_ref ‖ amount`. The amount is
//!   the integer rupiah value in decimal, with no separators or decimals. The gateway recomputes this and rejects
//!   the transaction on any difference, so the field order and formatting here are part of the contract.
//! * Callback signatures, over the raw callback body exactly as it was delivered. The body must not be parsed and
//!   re-serialized before verifying, since key order and whitespace would change the digest.
use hmac::{Hmac, Mac};
use log::*;
use panen_common::{Rupiah, Secret};
use sha2::Sha256;

use crate::SignatureError;

type HmacSha256 = Hmac<Sha256>;

fn new_mac(key: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

/// Hex-encoded HMAC-SHA256 of `data` under `key`.
pub fn calculate_hmac(key: &str, data: &[u8]) -> Result<String, SignatureError> {
    let mut mac = new_mac(key)?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// The string that is signed when creating a transaction.
pub fn transaction_signature_data(merchant_code: &str, merchant_ref: &str, amount: Rupiah) -> String {
    format!("{merchant_code}{merchant_ref}{}", amount.value())
}

pub fn transaction_signature(
    private_key: &Secret<String>,
    merchant_code: &str,
    merchant_ref: &str,
    amount: Rupiah,
) -> Result<String, SignatureError> {
    let data = transaction_signature_data(merchant_code, merchant_ref, amount);
    calculate_hmac(private_key.reveal(), data.as_bytes())
}

pub fn callback_signature(private_key: &Secret<String>, raw_body: &[u8]) -> Result<String, SignatureError> {
    calculate_hmac(private_key.reveal(), raw_body)
}

/// Checks the `X-Callback-Signature` value against the raw callback body.
///
/// The comparison is constant-time. A missing secret always fails, so an unconfigured server can never accept
/// callbacks.
pub fn verify_callback_signature(
    private_key: &Secret<String>,
    raw_body: &[u8],
    provided: Option<&str>,
) -> Result<(), SignatureError> {
    if !private_key.is_set() {
        error!("🔐️ No private key is configured. Rejecting callback.");
        return Err(SignatureError::MissingSecret);
    }
    let provided = provided.map(str::trim).filter(|s| !s.is_empty()).ok_or(SignatureError::MissingSignature)?;
    let provided = hex::decode(provided).map_err(|_| {
        debug!("🔐️ Callback signature is not valid hex");
        SignatureError::InvalidSignature
    })?;
    let mut mac = new_mac(private_key.reveal())?;
    mac.update(raw_body);
    mac.verify_slice(&provided).map_err(|_| SignatureError::InvalidSignature)
}
