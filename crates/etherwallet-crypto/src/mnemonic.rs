//! BIP39 mnemonic generation, validation, and seed derivation.
//!
//! Supports every BIP39 entropy size (128 to 256 bits in steps of 32):
//!
//! 1. **Generation**: `ENT` bits of entropy → SHA-256 checksum
//!    (`ENT / 32` bits) → `(ENT + CS) / 11` indices of 11 bits → words.
//! 2. **Validation**: Reconstruct entropy from the words, recompute and
//!    verify the checksum.
//! 3. **Seed derivation**: PBKDF2-HMAC-SHA512 with 2048 rounds,
//!    salt = `"mnemonic" + passphrase`, producing a 64-byte seed.
//!
//! Reference: <https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki>

use etherwallet_types::{EtherwalletError, Result};
use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::wordlist::{index_to_word, word_to_index};

/// Entropy sizes accepted by [`Mnemonic::generate`], in bits.
pub const SUPPORTED_ENTROPY_BITS: [usize; 5] = [128, 160, 192, 224, 256];

/// PBKDF2 iteration count fixed by BIP39.
const PBKDF2_ROUNDS: u32 = 2048;

// ---------------------------------------------------------------------------
// Mnemonic
// ---------------------------------------------------------------------------

/// A checksummed BIP39 mnemonic phrase (12 to 24 words).
///
/// Only constructible through generation, entropy conversion, or a
/// successful [`Mnemonic::parse`], so every value carries a valid
/// checksum. The inner string is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic(String);

// Mnemonic does not implement Clone/Debug to prevent leakage.

impl Mnemonic {
    /// Generates a fresh mnemonic from `entropy_bits` of OS randomness.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::EntropyError`] unless `entropy_bits` is one of
    /// [`SUPPORTED_ENTROPY_BITS`].
    pub fn generate(entropy_bits: usize) -> Result<Self> {
        check_entropy_bits(entropy_bits)?;

        let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
        OsRng.fill_bytes(&mut entropy);

        Self::from_entropy(&entropy)
    }

    /// Converts raw entropy into its mnemonic.
    ///
    /// This is the deterministic core of generation, exposed for
    /// published test vectors.
    ///
    /// # Process
    ///
    /// 1. `CS = ENT / 32` checksum bits from the front of `SHA-256(entropy)`.
    /// 2. Concatenate entropy bits and checksum bits.
    /// 3. Split into groups of 11 bits, each an index into the wordlist.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        let entropy_bits = entropy.len() * 8;
        check_entropy_bits(entropy_bits)?;

        let checksum_bits = entropy_bits / 32;
        let checksum_byte = Sha256::digest(entropy)[0];

        let mut bits = Zeroizing::new(Vec::with_capacity(entropy_bits + checksum_bits));
        for byte in entropy {
            for j in (0..8).rev() {
                bits.push((byte >> j) & 1);
            }
        }
        for j in 0..checksum_bits {
            bits.push((checksum_byte >> (7 - j)) & 1);
        }

        let word_count = bits.len() / 11;
        let mut words = Vec::with_capacity(word_count);
        for chunk in bits.chunks_exact(11) {
            let idx = chunk
                .iter()
                .fold(0u16, |acc, &bit| (acc << 1) | u16::from(bit));

            let word = index_to_word(idx).ok_or_else(|| EtherwalletError::EntropyError {
                reason: format!("BIP39 word index {idx} out of range"),
            })?;
            words.push(word);
        }

        Ok(Self(words.join(" ")))
    }

    /// Parses and validates a phrase.
    ///
    /// Whitespace is normalized and words are lower-cased before lookup.
    ///
    /// # Errors
    ///
    /// [`EtherwalletError::ChecksumError`] for a wrong word count, an
    /// unknown word, or a checksum mismatch.
    pub fn parse(phrase: &str) -> Result<Self> {
        let normalized = Zeroizing::new(
            phrase
                .split_whitespace()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" "),
        );
        validate_mnemonic(&normalized)?;
        Ok(Self(normalized.as_str().to_owned()))
    }

    /// Returns the mnemonic phrase as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the individual words.
    pub fn words(&self) -> Vec<&str> {
        self.0.split_whitespace().collect()
    }

    /// Returns the number of words in the mnemonic.
    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }

    /// Returns the entropy size this phrase encodes, in bits.
    pub fn entropy_bits(&self) -> usize {
        self.word_count() * 11 * 32 / 33
    }

    /// Derives the 64-byte seed for this phrase and `passphrase`.
    pub fn to_seed(&self, passphrase: &str) -> Result<Seed> {
        mnemonic_to_seed(&self.0, passphrase)
    }
}

/// Converts raw entropy (16 to 32 bytes, multiple of 4) into a mnemonic.
pub fn entropy_to_mnemonic(entropy: &[u8]) -> Result<Mnemonic> {
    Mnemonic::from_entropy(entropy)
}

fn check_entropy_bits(entropy_bits: usize) -> Result<()> {
    if SUPPORTED_ENTROPY_BITS.contains(&entropy_bits) {
        Ok(())
    } else {
        Err(EtherwalletError::EntropyError {
            reason: format!(
                "entropy must be one of {SUPPORTED_ENTROPY_BITS:?} bits, got {entropy_bits}"
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Seed
// ---------------------------------------------------------------------------

/// A 64-byte seed derived from a BIP39 mnemonic via PBKDF2-HMAC-SHA512.
///
/// This seed is the input to BIP32 master key generation. Automatically
/// zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; 64]);

impl Seed {
    /// Fixed byte length of a BIP39 seed.
    pub const LEN: usize = 64;

    /// Creates a [`Seed`] from a raw 64-byte array.
    ///
    /// Use this for test vectors. For normal operation, use
    /// [`Mnemonic::to_seed`].
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 64-byte seed.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

// Seed does not implement Clone/Debug to prevent leakage.

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validates a BIP39 mnemonic phrase.
///
/// # Checks performed
///
/// 1. Word count is 12, 15, 18, 21 or 24.
/// 2. Every word exists in the English wordlist.
/// 3. Reconstruct entropy from the 11-bit indices.
/// 4. Recompute `SHA-256(entropy)` and compare the checksum bits.
///
/// # Errors
///
/// Returns [`EtherwalletError::ChecksumError`] if any check fails.
pub fn validate_mnemonic(phrase: &str) -> Result<()> {
    let words: Vec<&str> = phrase.split_whitespace().collect();

    if words.len() % 3 != 0 || !(12..=24).contains(&words.len()) {
        return Err(EtherwalletError::ChecksumError {
            reason: format!(
                "mnemonic must have 12, 15, 18, 21 or 24 words, got {}",
                words.len()
            ),
        });
    }

    let total_bits = words.len() * 11;
    let checksum_bits = total_bits / 33;
    let entropy_bits = total_bits - checksum_bits;

    let mut bits = Zeroizing::new(Vec::with_capacity(total_bits));
    for word in &words {
        let idx = word_to_index(word).ok_or_else(|| EtherwalletError::ChecksumError {
            reason: format!("word '{word}' not in BIP39 wordlist"),
        })?;
        for j in (0..11).rev() {
            bits.push(((idx >> j) & 1) as u8);
        }
    }

    let mut entropy = Zeroizing::new(vec![0u8; entropy_bits / 8]);
    for (i, bit) in bits[..entropy_bits].iter().enumerate() {
        if *bit == 1 {
            entropy[i / 8] |= 1 << (7 - (i % 8));
        }
    }

    let provided = bits[entropy_bits..]
        .iter()
        .fold(0u8, |acc, &bit| (acc << 1) | bit);
    let expected = Sha256::digest(entropy.as_slice())[0] >> (8 - checksum_bits);

    if provided != expected {
        return Err(EtherwalletError::ChecksumError {
            reason: "BIP39 mnemonic checksum mismatch".into(),
        });
    }

    Ok(())
}

/// Returns `true` if `phrase` is a well-formed, checksummed mnemonic.
pub fn is_valid_mnemonic(phrase: &str) -> bool {
    validate_mnemonic(phrase).is_ok()
}

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derives a 64-byte seed from a mnemonic sentence and passphrase.
///
/// # Process (BIP39)
///
/// - **Password**: the mnemonic sentence.
/// - **Salt**: `"mnemonic"` concatenated with `passphrase`.
/// - **Algorithm**: PBKDF2-HMAC-SHA512, 2048 rounds, 64-byte output.
///
/// The sentence is not re-validated here; callers holding a
/// [`Mnemonic`] already have a checked phrase.
pub fn mnemonic_to_seed(mnemonic: &str, passphrase: &str) -> Result<Seed> {
    let mut salt = Zeroizing::new(Vec::with_capacity(8 + passphrase.len()));
    salt.extend_from_slice(b"mnemonic");
    salt.extend_from_slice(passphrase.as_bytes());

    let mut output = [0u8; 64];
    pbkdf2::pbkdf2::<Hmac<Sha512>>(mnemonic.as_bytes(), &salt, PBKDF2_ROUNDS, &mut output)
        .map_err(|e| EtherwalletError::DerivationError {
            reason: format!("PBKDF2-HMAC-SHA512 failed: {e}"),
        })?;

    Ok(Seed(output))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
