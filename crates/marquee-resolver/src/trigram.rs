//! Trigram similarity, pg_trgm style.
//!
//! Names are lowercased and split on non-alphanumeric boundaries; each
//! word is padded with two leading and one trailing space before its
//! 3-grams are collected. Similarity is shared trigrams over the union,
//! which lands in `[0, 1]` with 1.0 for case-insensitive equality.

use std::collections::HashSet;

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// Collect the padded trigram set of `text`.
fn trigrams(text: &str) -> HashSet<(char, char, char)> {
    let mut set = HashSet::new();
    let lowered = text.to_lowercase();
    for word in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut padded: Vec<char> = Vec::with_capacity(word.chars().count() + 3);
        padded.push(' ');
        padded.push(' ');
        padded.extend(word.chars());
        padded.push(' ');
        for window in padded.windows(3) {
            let _ = set.insert((window[0], window[1], window[2]));
        }
    }
    set
}

/// Trigram similarity of two strings in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() && tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    let union = ta.len() + tb.len() - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Register `similarity(a, b)` as a deterministic scalar SQL function.
///
/// Must run on every pooled connection; the store's init hook does this.
pub fn register_similarity(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a: String = ctx.get(0)?;
            let b: String = ctx.get(1)?;
            Ok(similarity(&a, &b))
        },
    )
}
