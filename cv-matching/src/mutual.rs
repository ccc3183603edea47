/// Pairs `(a, b)` where `b` is the neighbor kept for `a` and `a` is the neighbor kept for `b`.
///
/// Each map is indexed by query and holds the surviving nearest neighbor of that
/// query, or `None` if the query was filtered out. Every `a` appears at most once
/// and, since `b_to_a[b]` names a single `a`, so does every `b`. Pairs come out in
/// ascending order of `a`.
pub fn mutual_filter<'a>(
    a_to_b: &'a [Option<usize>],
    b_to_a: &'a [Option<usize>],
) -> impl Iterator<Item = (usize, usize)> + 'a {
    a_to_b.iter().enumerate().filter_map(move |(a, &b)| {
        let b = b?;
        (b_to_a.get(b).copied().flatten() == Some(a)).then_some((a, b))
    })
}
