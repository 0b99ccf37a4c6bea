//! Content-derived entry identifiers.
//!
//! Uses `blake3` over the canonical rendering, so the identifier is
//! stable across re-parses as long as the entry's content is unchanged,
//! and independent of the entry's position in the file.

use super::{Entry, render};

/// Identifier length in hex characters (64 bits of the blake3 digest).
const ID_LEN: usize = 16;

/// Compute the content-derived identifier of an entry.
///
/// Two entries share an identifier only when their canonical content is
/// identical. Source location (file, line) deliberately does not
/// participate: the id must survive line shifts caused by edits
/// elsewhere in the file.
pub fn content_hash(entry: &Entry) -> String {
    let canonical = render(entry);
    let digest = blake3::hash(canonical.as_bytes());
    digest.to_hex()[..ID_LEN].to_string()
}
