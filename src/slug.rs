use crate::site::{Error, Result};

/// Validates the `{slug}` part of `/episodes/{slug}`.
///
/// The slug is used both in upstream request paths and as an output
/// directory name, so only `[A-Za-z0-9_-]` is accepted.
pub fn episode_slug(s: &str) -> Result<&str> {
    let valid = !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    valid.then_some(s).ok_or(Error::BadRequest)
}
