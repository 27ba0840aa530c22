//! Minimum-version filtering and uniform selection over a catalog.
use crate::catalog::VersionKey;
use rand::Rng;

/// Index of the first entry whose version key is at least `threshold`.
///
/// Entries without a key are skipped. `None` means no entry qualifies and
/// the caller should fall back to the newest entry only.
pub fn find_minimum_index<T: VersionKey>(entries: &[T], threshold: u32) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.version_key().is_some_and(|key| key >= threshold))
}

/// Pick an entry uniformly from `[lower_bound, len - 1]`.
///
/// With `lower_bound == None` the last entry is returned without consuming
/// randomness. `entries` must be non-empty and `lower_bound` must come from
/// [`find_minimum_index`] over the same slice.
pub fn pick_uniform<'a, T, R>(entries: &'a [T], lower_bound: Option<usize>, rng: &mut R) -> &'a T
where
    R: Rng + ?Sized,
{
    let last = entries.len() - 1;
    match lower_bound {
        Some(start) => &entries[rng.gen_range(start..=last)],
        None => &entries[last],
    }
}
