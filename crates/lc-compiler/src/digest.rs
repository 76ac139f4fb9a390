use lc_core::ContentIdentity;
use sha1::{Digest, Sha1};

/// Identity of the exact text that will be loaded into the store.
///
/// Redis keys loaded scripts by SHA-1, so the digest here must be the same one
/// `SCRIPT LOAD` reports for `text`.
pub fn content_identity(text: &str) -> ContentIdentity {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    ContentIdentity::from_digest(hex::encode(hasher.finalize()))
}
