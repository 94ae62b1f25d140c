// Collection summaries used by every `describe`
//
// Only the first `max` elements are ever pulled from the iterator, so a
// summary of a lazily transformed subset costs at most `max` transforms.

use std::fmt::Debug;

use sieve_core::Result;

/// Number of elements shown when no other limit is configured.
pub const DEFAULT_REPR_ITEMS: usize = 10;

/// `(<len> items) [a,b,c...]` for up to `max` elements of `items`.
pub fn coll_repr<I>(len: usize, items: I, max: usize) -> String
where
    I: IntoIterator,
    I::Item: Debug,
{
    let shown: Vec<String> = items
        .into_iter()
        .take(max)
        .map(|o| format!("{o:?}"))
        .collect();
    finish(len, &shown, max)
}

/// Like [`coll_repr`] over fallible elements; the first error wins.
pub fn try_coll_repr<I, T>(len: usize, items: I, max: usize) -> Result<String>
where
    I: IntoIterator<Item = Result<T>>,
    T: Debug,
{
    let shown = items
        .into_iter()
        .take(max)
        .map(|o| o.map(|o| format!("{o:?}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(finish(len, &shown, max))
}

fn finish(len: usize, shown: &[String], max: usize) -> String {
    let more = if len > max { "..." } else { "" };
    format!("({len} items) [{}{more}]", shown.join(","))
}
