use alloy_primitives::{hex, Address, Signature, B256, U256};

use crate::{
    error::{KeyringError, KeyringResult},
    provider::ProviderError,
};

/// Turns a provider signature over `digest` into a canonical [`Signature`].
///
/// 65-byte signatures carry their own recovery value (`0/1`, `27/28` or
/// EIP-155 encoded). 64-byte signatures get their parity re-derived by
/// recovering against `signer`.
///
/// # Errors
///
/// Returns [`KeyringError::Provider`] when the signature is malformed and
/// [`KeyringError::SignatureVerificationFailed`] when no parity recovers `signer`.
pub fn normalize_signature(raw: &str, digest: &B256, signer: Address) -> KeyringResult<Signature> {
    let bytes = hex::decode(raw.trim())
        .map_err(|e| ProviderError::new(format!("malformed signature hex: {e}")))?;

    match bytes.len() {
        65 => Signature::from_raw(&bytes)
            .map_err(|e| ProviderError::new(format!("malformed signature: {e}")).into()),
        64 => {
            let r = U256::from_be_slice(&bytes[..32]);
            let s = U256::from_be_slice(&bytes[32..]);
            let candidates = [false, true].map(|parity| Signature::new(r, s, parity));
            if let Some(signature) = candidates
                .iter()
                .find(|sig| sig.recover_address_from_prehash(digest).ok() == Some(signer))
            {
                return Ok(*signature);
            }
            Err(KeyringError::SignatureVerificationFailed {
                expected: signer,
                recovered: candidates[0]
                    .recover_address_from_prehash(digest)
                    .unwrap_or(Address::ZERO),
            })
        }
        len => Err(ProviderError::new(format!("unexpected signature length {len}")).into()),
    }
}

/// Checks that `signature` over `digest` was produced by `expected`.
///
/// # Errors
///
/// Returns [`KeyringError::SignatureVerificationFailed`] on mismatch.
pub fn verify_signer(signature: &Signature, digest: &B256, expected: Address) -> KeyringResult<()> {
    let recovered = signature
        .recover_address_from_prehash(digest)
        .map_err(|e| ProviderError::new(format!("unrecoverable signature: {e}")))?;
    if recovered != expected {
        tracing::warn!(%expected, %recovered, "provider signature does not match signer");
        return Err(KeyringError::SignatureVerificationFailed {
            expected,
            recovered,
        });
    }
    Ok(())
}
