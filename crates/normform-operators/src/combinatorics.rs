//! Subset and two-way partition generators used by the 5NF search.
//!
//! Both are exponential by nature: `power_set` yields 2^n subsets and
//! `bipartitions` yields 2^(n-1) - 1 splits. Callers bound `n` up front.

/// Every subset of `elems`, built recursively. Element order within each
/// subset follows `elems`; the empty subset comes first.
pub fn power_set<T: Clone>(elems: &[T]) -> Vec<Vec<T>> {
    let Some((first, rest)) = elems.split_first() else {
        return vec![Vec::new()];
    };

    let without = power_set(rest);
    let with: Vec<Vec<T>> = without
        .iter()
        .map(|subset| {
            let mut s = Vec::with_capacity(subset.len() + 1);
            s.push(first.clone());
            s.extend(subset.iter().cloned());
            s
        })
        .collect();

    let mut out = without;
    out.extend(with);
    out
}

/// Every split of `elems` into two non-empty groups `(a, b)`.
///
/// The first element is pinned to `a`, so mirror images are produced once and
/// `a` can never be empty; the one choice that would leave `b` empty (all of
/// the rest joining `a`) is never generated. Fewer than two elements yield
/// nothing.
pub fn bipartitions<T: Clone>(elems: &[T]) -> Vec<(Vec<T>, Vec<T>)> {
    let Some((first, rest)) = elems.split_first() else {
        return Vec::new();
    };
    if rest.is_empty() {
        return Vec::new();
    }

    let indices: Vec<usize> = (0..rest.len()).collect();
    power_set(&indices)
        .into_iter()
        .filter(|joins_a| joins_a.len() < rest.len())
        .map(|joins_a| {
            let mut a = vec![first.clone()];
            let mut b = Vec::with_capacity(rest.len() - joins_a.len());
            for (i, item) in rest.iter().enumerate() {
                if joins_a.contains(&i) {
                    a.push(item.clone());
                } else {
                    b.push(item.clone());
                }
            }
            (a, b)
        })
        .collect()
}
