//! BIP39 English wordlist access.
//!
//! The 2048 words are taken from the `bip39` crate so the list is the
//! published one byte for byte. Only index/word lookup is used from it;
//! checksum and seed logic live in [`crate::mnemonic`].

use bip39::Language;

/// Number of words in the list (2^11).
pub const WORDLIST_LEN: usize = 2048;

/// Returns the full, alphabetically sorted English wordlist.
pub fn wordlist() -> &'static [&'static str; WORDLIST_LEN] {
    Language::English.word_list()
}

/// Returns the word at `index`, or `None` when `index >= 2048`.
pub fn index_to_word(index: u16) -> Option<&'static str> {
    wordlist().get(usize::from(index)).copied()
}

/// Returns the 11-bit index of `word`, or `None` if it is not listed.
pub fn word_to_index(word: &str) -> Option<u16> {
    Language::English.find_word(word)
}
