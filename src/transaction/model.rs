use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::TransactionError;
use crate::wallet::{normalize_address, verify_signature_hex};

/// An account-model value transfer.
///
/// `hash` covers `{nonce, from, to, value, gas_price, gas_limit, data}`;
/// `signature` and `timestamp` are outside the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub nonce: u64,
    pub from: String,
    pub to: String,
    pub value: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// Opaque payload, hex-encoded on the wire.
    #[serde(default, with = "hex::serde", skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<u8>,
    /// Hex-encoded DER ECDSA signature over the 32-byte hash.
    #[serde(default)]
    pub signature: String,
    pub timestamp: i64, // Unix timestamp (UTC)
}

/// Canonical hash preimage. Field order is part of the hash.
#[derive(Serialize)]
struct HashPayload<'a> {
    nonce: u64,
    from: &'a str,
    to: &'a str,
    value: u64,
    gas_price: u64,
    gas_limit: u64,
    #[serde(with = "hex::serde", skip_serializing_if = "<[u8]>::is_empty")]
    data: &'a [u8],
}

impl Transaction {
    /// Build an unsigned transaction and compute its hash.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nonce: u64,
        from: impl Into<String>,
        to: impl Into<String>,
        value: u64,
        gas_price: u64,
        gas_limit: u64,
        data: Vec<u8>,
        timestamp: i64,
    ) -> Self {
        let mut tx = Self {
            hash: String::new(),
            nonce,
            from: from.into(),
            to: to.into(),
            value,
            gas_price,
            gas_limit,
            data,
            signature: String::new(),
            timestamp,
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// SHA-256 (hex) of the canonical JSON of the hash-relevant fields.
    pub fn compute_hash(&self) -> String {
        hex::encode(self.digest())
    }

    fn digest(&self) -> [u8; 32] {
        let payload = HashPayload {
            nonce: self.nonce,
            from: &self.from,
            to: &self.to,
            value: self.value,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            data: &self.data,
        };
        // Serializing plain integers and strings cannot fail.
        let bytes = serde_json::to_vec(&payload).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest[..]);
        out
    }

    /// Upper bound on what the sender pays: `value + gas_price * gas_limit`.
    /// `None` on overflow.
    pub fn total_cost(&self) -> Option<u64> {
        self.gas_price
            .checked_mul(self.gas_limit)
            .and_then(|fee| fee.checked_add(self.value))
    }

    pub fn fee(&self) -> u64 {
        self.gas_price.saturating_mul(self.gas_limit)
    }

    /// Structural validity: non-empty sender, non-zero value, hash matches
    /// content, and the signature verifies against the sender's key.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.from.is_empty() {
            return Err(TransactionError::EmptySender);
        }
        if self.value == 0 {
            return Err(TransactionError::ZeroValue);
        }

        let digest = self.digest();
        let expected = hex::encode(digest);
        if self.hash != expected {
            return Err(TransactionError::HashMismatch {
                expected,
                actual: self.hash.clone(),
            });
        }

        if self.signature.is_empty() {
            return Err(TransactionError::MissingSignature);
        }
        // Accounts are keyed by the canonical form; any other spelling of
        // the same key would address a different account.
        match normalize_address(&self.from) {
            Ok(canonical) if canonical == self.from => {}
            _ => return Err(TransactionError::NonCanonicalSender(self.from.clone())),
        }
        match verify_signature_hex(&self.from, &self.signature, digest) {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransactionError::InvalidSignature("signature does not match sender")),
            Err(reason) => Err(TransactionError::InvalidSignature(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Keypair, signed_transfer};

    fn unsigned(nonce: u64, value: u64) -> Transaction {
        Transaction::new(nonce, "alice", "bob", value, 1, 21_000, vec![], 1_700_000_000)
    }

    #[test]
    fn hash_is_deterministic_and_ignores_signature_and_timestamp() {
        let a = unsigned(0, 10);
        let mut b = unsigned(0, 10);
        b.timestamp += 99;
        b.signature = "3044".into();
        assert_eq!(a.hash, b.compute_hash());
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn hash_covers_every_payload_field() {
        let base = unsigned(0, 10);
        let variants = [
            Transaction { nonce: 1, ..base.clone() },
            Transaction { from: "carol".into(), ..base.clone() },
            Transaction { to: "carol".into(), ..base.clone() },
            Transaction { value: 11, ..base.clone() },
            Transaction { gas_price: 2, ..base.clone() },
            Transaction { gas_limit: 1, ..base.clone() },
            Transaction { data: vec![1], ..base.clone() },
        ];
        for v in variants {
            assert_ne!(v.compute_hash(), base.hash);
        }
    }

    #[test]
    fn data_is_hex_on_the_wire_and_omitted_when_empty() {
        let mut tx = unsigned(0, 10);
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("data").is_none());

        tx.data = vec![0xde, 0xad];
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "dead");
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.data, vec![0xde, 0xad]);
    }

    #[test]
    fn validate_rejects_malformed() {
        let mut tx = unsigned(0, 10);
        tx.from.clear();
        tx.hash = tx.compute_hash();
        assert_eq!(tx.validate(), Err(TransactionError::EmptySender));

        let tx = unsigned(0, 0);
        assert_eq!(tx.validate(), Err(TransactionError::ZeroValue));

        let mut tx = unsigned(0, 10);
        tx.value = 20;
        assert!(matches!(tx.validate(), Err(TransactionError::HashMismatch { .. })));

        let tx = unsigned(0, 10);
        assert_eq!(tx.validate(), Err(TransactionError::MissingSignature));
    }

    #[test]
    fn validate_checks_signature_against_sender() {
        let alice = Keypair::generate();
        let mallory = Keypair::generate();
        let tx = signed_transfer(&alice, &mallory.address, 5, 0, 1);
        assert_eq!(tx.validate(), Ok(()));

        // Re-signed by someone else: hash still matches, signature does not.
        let forged = Transaction {
            signature: crate::testing::sign_digest(&mallory, hash_bytes(&tx)),
            ..tx.clone()
        };
        assert!(matches!(
            forged.validate(),
            Err(TransactionError::InvalidSignature(_))
        ));
    }

    #[test]
    fn validate_requires_canonical_sender() {
        let alice = Keypair::generate();
        let tx = signed_transfer(&alice, "bob", 5, 0, 1);

        let mut shouted = Transaction {
            from: alice.address.to_uppercase(),
            ..tx.clone()
        };
        shouted.hash = shouted.compute_hash();
        let shouted = crate::testing::sign(&alice, shouted);
        assert_eq!(
            shouted.validate(),
            Err(TransactionError::NonCanonicalSender(alice.address.to_uppercase()))
        );

        let mut named = unsigned(0, 10);
        named.signature = tx.signature.clone();
        assert_eq!(
            named.validate(),
            Err(TransactionError::NonCanonicalSender("alice".into()))
        );
    }

    #[test]
    fn total_cost_detects_overflow() {
        let mut tx = unsigned(0, 10);
        assert_eq!(tx.total_cost(), Some(10 + 21_000));
        tx.gas_price = u64::MAX;
        assert_eq!(tx.total_cost(), None);
    }

    fn hash_bytes(tx: &Transaction) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(&tx.hash).unwrap());
        out
    }
}
