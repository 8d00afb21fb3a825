//! Signature verification for transaction senders.
//!
//! Addresses are the hex of a compressed secp256k1 public key, so a
//! sender's address is also the key its signatures verify against.
//! Key generation and signing belong to the wallet collaborator.

use secp256k1::{Message, PublicKey, Secp256k1, ecdsa::Signature};

/// Canonical form of an address: the lowercase hex of the compressed key.
/// Uncompressed keys are folded to their compressed form.
pub fn normalize_address(address: &str) -> Result<String, &'static str> {
    let bytes = hex::decode(address.trim()).map_err(|_| "address is not hex")?;
    let key = PublicKey::from_slice(&bytes).map_err(|_| "address is not a secp256k1 public key")?;
    Ok(hex::encode(key.serialize()))
}

/// Verify a signature (hex DER) against the given pubkey (hex, compressed) and message hash (32 bytes).
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, &'static str> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| "invalid signature hex")?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| "invalid DER signature")?;

    let pk_bytes = hex::decode(pubkey_hex).map_err(|_| "invalid pubkey hex")?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| "invalid pubkey bytes")?;

    let msg = Message::from_digest(msg32);
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Keypair, sign_digest};

    #[test]
    fn addresses_normalize_to_lowercase_compressed() {
        let key = Keypair::generate();
        assert_eq!(normalize_address(&key.address.to_uppercase()).unwrap(), key.address);
        assert_eq!(normalize_address(&format!(" {} ", key.address)).unwrap(), key.address);

        let public = PublicKey::from_secret_key(&Secp256k1::new(), &key.secret);
        let uncompressed = hex::encode(public.serialize_uncompressed());
        assert_eq!(normalize_address(&uncompressed).unwrap(), key.address);
    }

    #[test]
    fn rejects_non_key_addresses() {
        assert_eq!(normalize_address("bob"), Err("address is not hex"));
        assert_eq!(normalize_address("abcd"), Err("address is not a secp256k1 public key"));
    }

    #[test]
    fn verifies_only_matching_key_and_digest() {
        let key = Keypair::generate();
        let other = Keypair::generate();
        let digest = [7u8; 32];
        let sig = sign_digest(&key, digest);

        assert_eq!(verify_signature_hex(&key.address, &sig, digest), Ok(true));
        assert_eq!(verify_signature_hex(&other.address, &sig, digest), Ok(false));
        assert_eq!(verify_signature_hex(&key.address, &sig, [8u8; 32]), Ok(false));
        assert_eq!(
            verify_signature_hex(&key.address, "00", digest),
            Err("invalid DER signature")
        );
    }
}
