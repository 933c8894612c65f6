//! # Name Uniquification
//!
//! Concatenating row types (as a star table does) can produce duplicate field
//! names. [`uniquify`] renames the later duplicates so every name is distinct while
//! keeping the first occurrence of each name unchanged and preserving order.
//!
//! Renaming is positional: the k-th occurrence of `name` becomes `name_k`. If that
//! candidate is already taken (for example because the input also contains a
//! literal `name_2`), the suffix keeps counting up until a free name is found.

use std::collections::{HashMap, HashSet};

/// Base used for fields that arrive without a name.
pub const ANONYMOUS_FIELD: &str = "EXPR$";

/// Make every name in `names` distinct.
///
/// The output has the same length and order as the input. Empty names are
/// treated as [`ANONYMOUS_FIELD`].
pub fn uniquify<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let base = match name.as_ref() {
            "" => ANONYMOUS_FIELD,
            other => other,
        };
        let occurrence = seen.entry(base.to_string()).or_insert(0);
        *occurrence += 1;

        if used.insert(base.to_string()) {
            out.push(base.to_string());
            continue;
        }

        let mut suffix = (*occurrence).max(2);
        loop {
            let candidate = format!("{base}_{suffix}");
            if used.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
            suffix += 1;
        }
    }
    out
}
