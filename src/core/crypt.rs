//! Encryption collaborator interface.
//!
//! Authentication and key derivation are not part of this crate; callers that
//! need to read encrypted documents install a [`Crypt`] implementation on the
//! reader. The core only makes two calls: an empty-password authentication
//! attempt at open time, and per-object decryption of stream payloads.

use super::error::Result;

/// Security-handler interface consumed by the parser.
pub trait Crypt {
    /// Attempts to authenticate with the given password. Returns whether the
    /// document keys are now usable.
    fn authenticate(&mut self, password: &[u8]) -> Result<bool>;

    /// Decrypts bytes that belong to the indirect object `(obj_num, gen)`.
    fn decrypt(&self, obj_num: u32, gen: u16, data: &[u8]) -> Result<Vec<u8>>;
}
