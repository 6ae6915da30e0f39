//! BIP32 hierarchical deterministic key derivation over secp256k1.
//!
//! # Derivation path format
//!
//! ```text
//! m/44'/60'/0'/0/0
//! ```
//!
//! A `'`, `h` or `H` suffix marks a hardened index. The account path
//! used by the wallet hardens the first three segments.
//!
//! # Degenerate children
//!
//! When `IL >= n` or the child scalar (or point) is zero, that index is
//! unusable. Derivation moves on to `index + 1` instead of producing a
//! degenerate key; the index actually used is recorded in
//! [`ExtendedKey::child_index`]. The probability is below 2^-127 per step.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>

use std::fmt;
use std::str::FromStr;

use etherwallet_types::{EtherwalletError, Result};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, FieldBytes, ProjectivePoint, Scalar};
use zeroize::{Zeroize, Zeroizing};

use crate::hash::hash160;
use crate::mac::hmac_sha512;
use crate::mnemonic::Seed;
use crate::signing::{KeyPair, PrivateKey, PublicKey};

/// The hardened index offset (0x80000000).
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// HMAC key for master key generation.
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

// ---------------------------------------------------------------------------
// ChildIndex / DerivationPath
// ---------------------------------------------------------------------------

/// One path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildIndex {
    /// Index without the hardened offset, `< 2^31`.
    pub index: u32,
    /// Whether the segment uses hardened derivation.
    pub hardened: bool,
}

impl ChildIndex {
    /// Normal (public-derivable) segment.
    pub fn normal(index: u32) -> Self {
        Self {
            index,
            hardened: false,
        }
    }

    /// Hardened segment.
    pub fn hardened(index: u32) -> Self {
        Self {
            index,
            hardened: true,
        }
    }

    /// The 32-bit value serialized into the HMAC input.
    pub fn raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// Ordered list of derivation segments starting at the master key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    /// `m/44'/60'/0'/0/{index}`: external chain account `index`.
    pub fn ethereum_account(index: u32) -> Self {
        Self(vec![
            ChildIndex::hardened(44),
            ChildIndex::hardened(60),
            ChildIndex::hardened(0),
            ChildIndex::normal(0),
            ChildIndex::normal(index),
        ])
    }

    /// Builds a path from segments.
    pub fn new(segments: Vec<ChildIndex>) -> Self {
        Self(segments)
    }

    /// Returns the segments in derivation order.
    pub fn segments(&self) -> &[ChildIndex] {
        &self.0
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = EtherwalletError;

    /// Parses `m/44'/60'/0'/0/0`. The leading `m` is optional and `m`
    /// alone is the empty path.
    fn from_str(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        let components = match trimmed {
            "m" | "M" | "" => return Ok(Self::default()),
            _ => trimmed
                .strip_prefix("m/")
                .or_else(|| trimmed.strip_prefix("M/"))
                .unwrap_or(trimmed),
        };

        let mut segments = Vec::new();
        for part in components.split('/') {
            let part = part.trim();
            if part.is_empty() {
                return Err(EtherwalletError::DerivationError {
                    reason: format!("empty component in derivation path '{trimmed}'"),
                });
            }

            let hardened_marker = |c: char| matches!(c, '\'' | 'h' | 'H');
            let (num_str, hardened) = match part.strip_suffix(hardened_marker) {
                Some(rest) => (rest, true),
                None => (part, false),
            };

            let index: u32 = num_str.parse().map_err(|e| EtherwalletError::DerivationError {
                reason: format!("invalid index '{num_str}' in path: {e}"),
            })?;

            if index >= HARDENED_OFFSET {
                return Err(EtherwalletError::DerivationError {
                    reason: format!("index {index} exceeds maximum ({})", HARDENED_OFFSET - 1),
                });
            }

            segments.push(ChildIndex { index, hardened });
        }

        Ok(Self(segments))
    }
}

// ---------------------------------------------------------------------------
// ExtendedKey
// ---------------------------------------------------------------------------

/// A key plus chain code, able to derive further children.
///
/// Holds the private scalar unless it has been [neutered](Self::neuter),
/// in which case only non-hardened children can be derived.
pub struct ExtendedKey {
    private_key: Option<PrivateKey>,
    public_key: PublicKey,
    chain_code: Zeroizing<[u8; 32]>,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_index: u32,
}

// ExtendedKey does not implement Clone/Debug to prevent leakage.

impl ExtendedKey {
    /// Master key from a seed.
    ///
    /// `I = HMAC-SHA512(key = "Bitcoin seed", data = seed)`;
    /// `IL` is the master scalar, `IR` the master chain code.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::DerivationError`] if `IL` is zero or not below
    /// the curve order (the seed is unusable).
    pub fn master(seed: &Seed) -> Result<Self> {
        Self::master_from_bytes(seed.as_bytes())
    }

    /// Master key from raw seed bytes (BIP32 allows 16 to 64 bytes).
    pub fn master_from_bytes(seed: &[u8]) -> Result<Self> {
        if !(16..=64).contains(&seed.len()) {
            return Err(EtherwalletError::DerivationError {
                reason: format!("seed must be 16..=64 bytes, got {}", seed.len()),
            });
        }

        let mut i = Zeroizing::new(hmac_sha512(MASTER_HMAC_KEY, seed)?);
        let mut il = Zeroizing::new([0u8; 32]);
        let mut chain_code = Zeroizing::new([0u8; 32]);
        il.copy_from_slice(&i[..32]);
        chain_code.copy_from_slice(&i[32..]);
        i.zeroize();

        let private_key =
            PrivateKey::from_bytes(&il).map_err(|_| EtherwalletError::DerivationError {
                reason: "seed produces an invalid master key".into(),
            })?;

        Ok(Self {
            public_key: private_key.public_key(),
            private_key: Some(private_key),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_index: 0,
        })
    }

    /// Derives the child at `index`.
    ///
    /// - Hardened: `data = 0x00 ‖ ser256(k_par) ‖ ser32(index | 2^31)`.
    /// - Normal: `data = serP(K_par) ‖ ser32(index)`.
    ///
    /// `I = HMAC-SHA512(key = c_par, data)`, child scalar
    /// `(IL + k_par) mod n`, child chain code `IR`. Public-only keys
    /// compute the child point `IL·G + K_par` instead.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::DerivationError`] for hardened derivation from
    /// a public-only key, an index `>= 2^31`, or when every remaining
    /// index in the range is degenerate.
    pub fn derive_child(&self, child: ChildIndex) -> Result<Self> {
        if child.index >= HARDENED_OFFSET {
            return Err(EtherwalletError::DerivationError {
                reason: format!("child index {} exceeds maximum", child.index),
            });
        }
        if child.hardened && self.private_key.is_none() {
            return Err(EtherwalletError::DerivationError {
                reason: "hardened derivation requires a private key".into(),
            });
        }

        for index in child.index..HARDENED_OFFSET {
            let candidate = ChildIndex {
                index,
                hardened: child.hardened,
            };
            if let Some(derived) = self.try_derive(candidate)? {
                return Ok(derived);
            }
        }

        Err(EtherwalletError::DerivationError {
            reason: format!("no valid child index at or after {}", child.index),
        })
    }

    /// Folds [`Self::derive_child`] over every segment of `path`.
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        let mut segments = path.segments().iter();
        let mut current = match segments.next() {
            Some(first) => self.derive_child(*first)?,
            None => return self.duplicate(),
        };
        for segment in segments {
            current = current.derive_child(*segment)?;
        }
        Ok(current)
    }

    /// Returns the public-only counterpart of this key.
    pub fn neuter(&self) -> Self {
        Self {
            private_key: None,
            public_key: self.public_key,
            chain_code: self.chain_code.clone(),
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_index: self.child_index,
        }
    }

    /// The private key, or `None` for a neutered key.
    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    /// The public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Chain code used for child derivation.
    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Distance from the master key.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Fingerprint of the parent key (zero for the master key).
    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    /// Raw child index, including the hardened bit.
    pub fn child_index(&self) -> u32 {
        self.child_index
    }

    /// First 4 bytes of HASH160 of the compressed public key.
    pub fn fingerprint(&self) -> [u8; 4] {
        let h = hash160(&self.public_key.to_compressed());
        [h[0], h[1], h[2], h[3]]
    }

    /// Consumes the extended key and returns its keypair.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::DerivationError`] for a neutered key.
    pub fn into_keypair(self) -> Result<KeyPair> {
        match self.private_key {
            Some(key) => Ok(KeyPair::from_private(key)),
            None => Err(EtherwalletError::DerivationError {
                reason: "public-only key has no keypair".into(),
            }),
        }
    }

    /// One derivation attempt. `Ok(None)` means the index is degenerate.
    fn try_derive(&self, child: ChildIndex) -> Result<Option<Self>> {
        let mut data = Zeroizing::new(Vec::with_capacity(37));
        match (&self.private_key, child.hardened) {
            (Some(key), true) => {
                data.push(0x00);
                data.extend_from_slice(key.to_bytes().as_slice());
            }
            _ => data.extend_from_slice(&self.public_key.to_compressed()),
        }
        data.extend_from_slice(&child.raw().to_be_bytes());

        let i = Zeroizing::new(hmac_sha512(self.chain_code.as_slice(), &data)?);
        let mut il = Zeroizing::new([0u8; 32]);
        let mut chain_code = Zeroizing::new([0u8; 32]);
        il.copy_from_slice(&i[..32]);
        chain_code.copy_from_slice(&i[32..]);

        let (private_key, public_key) = match &self.private_key {
            Some(parent) => {
                let parent_scalar = *parent.inner.as_nonzero_scalar().as_ref();
                let Some(child_scalar) = tweak_scalar(&parent_scalar, &il) else {
                    return Ok(None);
                };
                let mut bytes = Zeroizing::new([0u8; 32]);
                bytes.copy_from_slice(&child_scalar.to_repr());
                let key = PrivateKey::from_bytes(&bytes)?;
                let public = key.public_key();
                (Some(key), public)
            }
            None => {
                let Some(point) = tweak_point(&self.public_key, &il) else {
                    return Ok(None);
                };
                (None, point)
            }
        };

        Ok(Some(Self {
            private_key,
            public_key,
            chain_code,
            depth: self.depth.saturating_add(1),
            parent_fingerprint: self.fingerprint(),
            child_index: child.raw(),
        }))
    }

    fn duplicate(&self) -> Result<Self> {
        let private_key = match &self.private_key {
            Some(key) => Some(PrivateKey::from_bytes(&key.to_bytes())?),
            None => None,
        };
        Ok(Self {
            private_key,
            ..self.neuter()
        })
    }
}

/// Derives the account keypair at `path` directly from a seed.
pub fn derive_path(seed: &Seed, path: &DerivationPath) -> Result<KeyPair> {
    ExtendedKey::master(seed)?.derive_path(path)?.into_keypair()
}

// ---------------------------------------------------------------------------
// Internal: scalar / point tweaks
// ---------------------------------------------------------------------------

/// `(IL + parent) mod n`, or `None` when `IL >= n` or the sum is zero.
fn tweak_scalar(parent: &Scalar, il: &[u8; 32]) -> Option<Scalar> {
    let tweak: Scalar = Option::from(Scalar::from_repr(FieldBytes::from(*il)))?;
    let child = tweak + parent;
    if bool::from(child.is_zero()) {
        None
    } else {
        Some(child)
    }
}

/// `IL·G + parent`, or `None` when `IL >= n` or the sum is the identity.
fn tweak_point(parent: &PublicKey, il: &[u8; 32]) -> Option<PublicKey> {
    let tweak: Scalar = Option::from(Scalar::from_repr(FieldBytes::from(*il)))?;
    let point = ProjectivePoint::GENERATOR * tweak + parent.0.to_projective();
    k256::PublicKey::from_affine(AffinePoint::from(point))
        .ok()
        .map(PublicKey)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// secp256k1 order `n`, big-endian. `n - 1` ends in 0x40, so no carry.
    fn curve_order() -> [u8; 32] {
        let mut n: [u8; 32] = (-Scalar::ONE).to_bytes().into();
        n[31] += 1;
        n
    }

    // --- Path parsing ---

    #[test]
    fn parse_account_path() -> std::result::Result<(), EtherwalletError> {
        let path: DerivationPath = "m/44'/60'/0'/0/0".parse()?;
        assert_eq!(path, DerivationPath::ethereum_account(0));
        assert_eq!(path.to_string(), "m/44'/60'/0'/0/0");
        Ok(())
    }

    #[test]
    fn parse_h_suffixes() -> std::result::Result<(), EtherwalletError> {
        let path: DerivationPath = "m/44h/60H/0'/1/7".parse()?;
        assert_eq!(path.to_string(), "m/44'/60'/0'/1/7");
        Ok(())
    }

    #[test]
    fn parse_master_only() -> std::result::Result<(), EtherwalletError> {
        let path: DerivationPath = "m".parse()?;
        assert!(path.segments().is_empty());
        Ok(())
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("m/44'//0".parse::<DerivationPath>().is_err());
        assert!("m/abc".parse::<DerivationPath>().is_err());
        assert!("m/2147483648".parse::<DerivationPath>().is_err());
        assert!("m/-1".parse::<DerivationPath>().is_err());
    }

    // --- Tweaks ---

    #[test]
    fn tweak_rejects_il_at_or_above_order() {
        let parent = Scalar::ONE;
        assert!(tweak_scalar(&parent, &curve_order()).is_none());
        assert!(tweak_scalar(&parent, &[0xff; 32]).is_none());
    }

    #[test]
    fn tweak_rejects_zero_child() {
        // IL = n - 1 and parent = 1 sum to n ≡ 0.
        let mut il = curve_order();
        il[31] -= 1;
        assert!(tweak_scalar(&Scalar::ONE, &il).is_none());
    }

    #[test]
    fn tweak_point_matches_tweak_scalar() -> std::result::Result<(), EtherwalletError> {
        let parent = PrivateKey::from_bytes(&[0x21; 32])?;
        let il = [0x05; 32];
        let parent_scalar = *parent.inner.as_nonzero_scalar().as_ref();

        let child_scalar = tweak_scalar(&parent_scalar, &il).ok_or_else(|| {
            EtherwalletError::DerivationError {
                reason: "unexpected degenerate tweak".into(),
            }
        })?;
        let child_point = tweak_point(&parent.public_key(), &il).ok_or_else(|| {
            EtherwalletError::DerivationError {
                reason: "unexpected degenerate tweak".into(),
            }
        })?;

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&child_scalar.to_repr());
        assert_eq!(PrivateKey::from_bytes(&bytes)?.public_key(), child_point);
        Ok(())
    }

    // --- Metadata ---

    #[test]
    fn child_metadata() -> std::result::Result<(), EtherwalletError> {
        let master = ExtendedKey::master(&Seed::from_bytes([0x42; 64]))?;
        let child = master.derive_child(ChildIndex::hardened(44))?;
        assert_eq!(master.depth(), 0);
        assert_eq!(master.parent_fingerprint(), [0u8; 4]);
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent_fingerprint(), master.fingerprint());
        assert_eq!(child.child_index(), 44 | HARDENED_OFFSET);
        Ok(())
    }

    #[test]
    fn neutered_key_rejects_hardened() -> std::result::Result<(), EtherwalletError> {
        let master = ExtendedKey::master(&Seed::from_bytes([0x42; 64]))?;
        let public = master.neuter();
        assert!(public.private_key().is_none());
        assert!(matches!(
            public.derive_child(ChildIndex::hardened(0)),
            Err(EtherwalletError::DerivationError { .. })
        ));
        assert!(public.into_keypair().is_err());
        Ok(())
    }

    #[test]
    fn public_derivation_matches_private() -> std::result::Result<(), EtherwalletError> {
        let account = ExtendedKey::master(&Seed::from_bytes([0x42; 64]))?
            .derive_path(&"m/44'/60'/0'/0".parse()?)?;
        let via_private = account.derive_child(ChildIndex::normal(3))?;
        let via_public = account.neuter().derive_child(ChildIndex::normal(3))?;
        assert_eq!(via_private.public_key(), via_public.public_key());
        assert_eq!(via_private.chain_code(), via_public.chain_code());
        Ok(())
    }

    #[test]
    fn empty_path_returns_same_key() -> std::result::Result<(), EtherwalletError> {
        let master = ExtendedKey::master(&Seed::from_bytes([0x42; 64]))?;
        let same = master.derive_path(&DerivationPath::default())?;
        assert_eq!(master.public_key(), same.public_key());
        assert!(same.private_key().is_some());
        Ok(())
    }

    #[test]
    fn derivation_is_deterministic() -> std::result::Result<(), EtherwalletError> {
        let seed = Seed::from_bytes([0x42; 64]);
        let path = DerivationPath::ethereum_account(0);
        let kp1 = derive_path(&seed, &path)?;
        let kp2 = derive_path(&seed, &path)?;
        assert_eq!(kp1.public_key(), kp2.public_key());

        let other = derive_path(&seed, &DerivationPath::ethereum_account(1))?;
        assert_ne!(kp1.public_key(), other.public_key());
        Ok(())
    }

    #[test]
    fn short_seed_rejected() {
        assert!(ExtendedKey::master_from_bytes(&[0u8; 15]).is_err());
        assert!(ExtendedKey::master_from_bytes(&[0u8; 65]).is_err());
    }
}
