//! Ordered fallback resolution shared by every "use A, or B, or a default" lookup
//! (client executable paths, password, passphrase).

/// Return the first candidate that is present and non-empty.
pub fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.is_empty())
}

/// Like [`first_present`], falling back to `default` when no candidate is set.
pub fn first_present_or<'a>(candidates: &[Option<&'a str>], default: &'a str) -> &'a str {
    first_present(candidates).unwrap_or(default)
}
