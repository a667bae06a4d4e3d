//! Suffix-set expansion for approximate substring search.
//!
//! A token-equality full-text index can only answer "does this field contain
//! the token X". Storing every suffix of every token next to the field turns
//! that into "does any token in the field end with X", which, combined with a
//! prefix query, gives substring search without a dedicated substring index.

use std::collections::BTreeSet;

/// Space-joined set of the suffixes of every space-separated token in
/// `field`.
///
/// Suffixes start at character offset 1 (offset 0 too when `include_self`),
/// so a single-character token contributes nothing unless `include_self` is
/// set. Duplicates across tokens collapse. The output is sorted, which keeps
/// rebuilds byte-identical; nothing downstream depends on the order.
pub fn suffix_set(field: &str, include_self: bool) -> String {
    let skip = usize::from(!include_self);
    let mut suffixes = BTreeSet::new();

    for token in field.split(' ') {
        for (offset, _) in token.char_indices().skip(skip) {
            suffixes.insert(&token[offset..]);
        }
    }

    suffixes.into_iter().collect::<Vec<_>>().join(" ")
}
