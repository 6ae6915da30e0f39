//! Legacy transactions with EIP-155 replay protection.
//!
//! # Signing
//!
//! ```text
//! signing_hash = keccak256(rlp([nonce, gas_price, gas_limit, to, value, data, chain_id, 0, 0]))
//! (r, s, recovery_id) = ECDSA-secp256k1(private_key, signing_hash)   // RFC 6979, low-S
//! v = recovery_id + 35 + 2 · chain_id
//! ```
//!
//! # Envelope
//!
//! ```text
//! rlp([nonce, gas_price, gas_limit, to, value, data, v, r, s])
//! ```
//!
//! The transaction hash is `keccak256` of the envelope. Decoding also
//! accepts pre-EIP-155 signatures (`v` ∈ {27, 28}).

use alloy_primitives::{Bytes, U256};
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use etherwallet_crypto::address::address_of;
use etherwallet_crypto::hash::keccak256;
use etherwallet_crypto::signing::{recover_public_key, PrivateKey, RecoverableSignature};
use etherwallet_types::{Address, ChainParameters, EtherwalletError, Result, TxHash};
use serde::Serialize;

/// Offset added to the recovery id for EIP-155 signatures.
const EIP155_V_OFFSET: u64 = 35;

/// Offset added to the recovery id for pre-EIP-155 signatures.
const LEGACY_V_OFFSET: u64 = 27;

// ---------------------------------------------------------------------------
// RLP field layouts
// ---------------------------------------------------------------------------

/// Pre-EIP-155 signing payload.
#[derive(RlpEncodable)]
struct LegacyPayload {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: alloy_primitives::Address,
    value: U256,
    data: Bytes,
}

/// EIP-155 signing payload: the six base fields, then `chain_id, 0, 0`.
#[derive(RlpEncodable)]
struct Eip155Payload {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: alloy_primitives::Address,
    value: U256,
    data: Bytes,
    chain_id: u64,
    empty_r: u64,
    empty_s: u64,
}

/// Signed envelope. `to` stays raw so an empty recipient can be
/// reported as contract creation rather than a length error.
#[derive(RlpEncodable, RlpDecodable)]
struct Envelope {
    nonce: u64,
    gas_price: U256,
    gas_limit: u64,
    to: Bytes,
    value: U256,
    data: Bytes,
    v: u64,
    r: U256,
    s: U256,
}

fn rlp_error(e: alloy_rlp::Error) -> EtherwalletError {
    EtherwalletError::EncodingError {
        reason: format!("RLP: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An unsigned value transfer or contract call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Sender's sequence number.
    pub nonce: u64,
    /// Price per unit of gas, in wei.
    pub gas_price: U256,
    /// Maximum gas the transaction may consume.
    pub gas_limit: u64,
    /// Recipient account.
    pub to: Address,
    /// Amount transferred, in wei.
    pub value: U256,
    /// Call data (empty for a plain transfer).
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl Transaction {
    /// Assembles a transaction from freshly fetched chain parameters.
    ///
    /// `nonce` and `gas_price` come from `params`; they must have been
    /// queried immediately before this call.
    pub fn build(
        to: Address,
        value: U256,
        gas_limit: u64,
        params: &ChainParameters,
        data: Vec<u8>,
    ) -> Self {
        Self {
            nonce: params.pending_nonce,
            gas_price: params.suggested_gas_price,
            gas_limit,
            to,
            value,
            data,
        }
    }

    /// The EIP-155 digest to sign for `chain_id`.
    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        let payload = Eip155Payload {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to.into(),
            value: self.value,
            data: Bytes::copy_from_slice(&self.data),
            chain_id,
            empty_r: 0,
            empty_s: 0,
        };
        keccak256(&alloy_rlp::encode(payload))
    }

    /// The pre-EIP-155 digest (six fields, no chain id).
    pub fn legacy_signing_hash(&self) -> [u8; 32] {
        let payload = LegacyPayload {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to.into(),
            value: self.value,
            data: Bytes::copy_from_slice(&self.data),
        };
        keccak256(&alloy_rlp::encode(payload))
    }

    /// Signs the transaction for `chain_id`.
    ///
    /// Signing is deterministic: the same key, transaction and chain id
    /// always produce the same envelope.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::SigningError`] if ECDSA fails or `v` would
    /// overflow 64 bits.
    pub fn sign(self, key: &PrivateKey, chain_id: u64) -> Result<SignedTransaction> {
        let hash = self.signing_hash(chain_id);
        let signature = key.sign_prehash(&hash)?;

        let v = chain_id
            .checked_mul(2)
            .and_then(|x| x.checked_add(EIP155_V_OFFSET + u64::from(signature.recovery_id)))
            .ok_or_else(|| EtherwalletError::SigningError {
                reason: format!("chain id {chain_id} too large for EIP-155 v"),
            })?;

        let signed = SignedTransaction {
            tx: self,
            v,
            r: U256::from_be_bytes(signature.r),
            s: U256::from_be_bytes(signature.s),
        };
        tracing::debug!(
            nonce = signed.tx.nonce,
            chain_id,
            hash = %signed.hash(),
            "transaction signed"
        );
        Ok(signed)
    }

}

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// A transaction plus its `(v, r, s)` signature. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    tx: Transaction,
    v: u64,
    r: U256,
    s: U256,
}

impl SignedTransaction {
    /// The unsigned fields.
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Signature `v`.
    pub fn v(&self) -> u64 {
        self.v
    }

    /// Signature `r`.
    pub fn r(&self) -> U256 {
        self.r
    }

    /// Signature `s`.
    pub fn s(&self) -> U256 {
        self.s
    }

    /// Chain id bound into `v`, or `None` for a pre-EIP-155 signature.
    pub fn chain_id(&self) -> Option<u64> {
        if self.v >= EIP155_V_OFFSET {
            Some((self.v - EIP155_V_OFFSET) / 2)
        } else {
            None
        }
    }

    /// The canonical envelope bytes broadcast to the network.
    pub fn encode(&self) -> Vec<u8> {
        alloy_rlp::encode(Envelope {
            nonce: self.tx.nonce,
            gas_price: self.tx.gas_price,
            gas_limit: self.tx.gas_limit,
            to: Bytes::copy_from_slice(self.tx.to.as_bytes()),
            value: self.tx.value,
            data: Bytes::copy_from_slice(&self.tx.data),
            v: self.v,
            r: self.r,
            s: self.s,
        })
    }

    /// `0x`-prefixed hex of [`Self::encode`].
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }

    /// Keccak-256 of the envelope: the network's transaction id.
    pub fn hash(&self) -> TxHash {
        TxHash::new(keccak256(&self.encode()))
    }

    /// Parses an envelope.
    ///
    /// The envelope is a flat list of nine fields. A nested list in any
    /// field position is rejected without descending into it.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::EncodingError`] for malformed or non-canonical
    /// RLP, a wrong field count, trailing bytes, a contract-creation
    /// envelope (empty `to`), or a `v` that is neither 27/28 nor ≥ 35.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        let envelope = Envelope::decode(&mut buf).map_err(rlp_error)?;
        if !buf.is_empty() {
            return Err(EtherwalletError::EncodingError {
                reason: format!("{} trailing bytes after transaction", buf.len()),
            });
        }

        if envelope.to.is_empty() {
            return Err(EtherwalletError::EncodingError {
                reason: "contract creation transactions are not supported".into(),
            });
        }
        let to = Address::from_slice(&envelope.to).map_err(|e| {
            EtherwalletError::EncodingError {
                reason: format!("bad recipient field: {e}"),
            }
        })?;

        let v = envelope.v;
        if v != 27 && v != 28 && v < EIP155_V_OFFSET {
            return Err(EtherwalletError::EncodingError {
                reason: format!("unsupported signature v value {v}"),
            });
        }

        Ok(Self {
            tx: Transaction {
                nonce: envelope.nonce,
                gas_price: envelope.gas_price,
                gas_limit: envelope.gas_limit,
                to,
                value: envelope.value,
                data: envelope.data.to_vec(),
            },
            v,
            r: envelope.r,
            s: envelope.s,
        })
    }

    /// Parses `0x`-prefixed (or bare) envelope hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body.strip_prefix("0x").unwrap_or(body);
        let bytes = hex::decode(body).map_err(|_| EtherwalletError::EncodingError {
            reason: "raw transaction is not valid hex".into(),
        })?;
        Self::decode(&bytes)
    }

    /// Recovers the address that signed this transaction.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::SigningError`] if the signature does not
    /// recover to a valid key.
    pub fn recover_sender(&self) -> Result<Address> {
        let (hash, recovery_id) = match self.chain_id() {
            Some(chain_id) => (
                self.tx.signing_hash(chain_id),
                (self.v - EIP155_V_OFFSET) % 2,
            ),
            None => (self.tx.legacy_signing_hash(), self.v - LEGACY_V_OFFSET),
        };

        let signature = RecoverableSignature {
            r: self.r.to_be_bytes::<32>(),
            s: self.s.to_be_bytes::<32>(),
            recovery_id: recovery_id as u8,
        };
        let public_key = recover_public_key(&hash, &signature)?;
        Ok(address_of(&public_key))
    }
}

fn serialize_hex<S: serde::Serializer>(
    data: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(data)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
