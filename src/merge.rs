//! Keyed upsert into a list of sub-blocks.
//!
//! Device output for a repeated sub-block arrives as many independent lines
//! (`range R1 low ...`, `range R1 high ...`). Each line locates the entry for
//! its key, creating it on first sight, so all lines for one key accumulate
//! into a single record.

use std::fmt::Display;
use std::str::FromStr;

/// A record identified within its parent list by one key field.
pub trait Keyed {
    /// Key type, parsed from the first token after the block keyword
    type Key: PartialEq + FromStr + Display + Clone;

    /// The key of this entry.
    fn key(&self) -> &Self::Key;

    /// A new entry with every other field at its default.
    fn with_key(key: Self::Key) -> Self;
}

/// Find the entry whose key equals `key`, or append one built by `template`.
///
/// The returned reference points into `list`, so writes through it land on
/// the stored entry.
pub fn upsert_with<'a, T, K, F, N>(list: &'a mut Vec<T>, key: &K, key_of: F, template: N) -> &'a mut T
where
    K: PartialEq + ?Sized,
    F: Fn(&T) -> &K,
    N: FnOnce() -> T,
{
    let index = match list.iter().position(|entry| key_of(entry) == key) {
        Some(index) => index,
        None => {
            list.push(template());
            list.len() - 1
        }
    };
    &mut list[index]
}

/// [`upsert_with`] for [`Keyed`] records.
pub fn upsert<T: Keyed>(list: &mut Vec<T>, key: T::Key) -> &mut T {
    let probe = key.clone();
    upsert_with(list, &probe, T::key, move || T::with_key(key))
}
