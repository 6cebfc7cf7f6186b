use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `source`. The only cache key function.
pub fn content_hash(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// Whether `name` is a stored artifact file name, `{hash}.pdf`.
pub fn artifact_hash(name: &str) -> Option<&str> {
    let hash = name.strip_suffix(".pdf")?;
    let valid = hash.len() == 64
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    valid.then_some(hash)
}
