//! The signature merge of §4.2: a union of two insertion-ordered signature
//! lists, keyed by signer, that rejects a key reappearing with a mutated
//! `(type, value)` pair.

use crate::error::ProtocolError;
use crate::record::SignatureEntry;

/// Merges `incoming` into `prior`. Keys present in both must agree on
/// `(type, value)` exactly, or the merge fails with `SignatureMutated`.
/// Retained `prior` entries come first, in `prior`'s order; entries only
/// in `incoming` are appended afterward, in `incoming`'s order.
pub fn merge_signatures(
    prior: &[SignatureEntry],
    incoming: &[SignatureEntry],
) -> Result<Vec<SignatureEntry>, ProtocolError> {
    let mut merged = Vec::with_capacity(prior.len() + incoming.len());
    for prior_entry in prior {
        if let Some(incoming_entry) = incoming.iter().find(|e| e.key == prior_entry.key) {
            if incoming_entry.sig_type != prior_entry.sig_type
                || incoming_entry.value != prior_entry.value
            {
                return Err(ProtocolError::SignatureMutated);
            }
        }
        merged.push(prior_entry.clone());
    }
    for incoming_entry in incoming {
        if !prior.iter().any(|e| e.key == incoming_entry.key) {
            merged.push(incoming_entry.clone());
        }
    }
    Ok(merged)
}
