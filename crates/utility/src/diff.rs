//! Longest-common-subsequence alignment, used by the matrix builder to splice
//! a trip's stops into an existing row order when a cycle rules out a
//! topological sort (see `matrix::rows`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// present in both sequences at this point
    Keep,
    /// present only in `old`
    Remove,
    /// present only in `new`
    Insert,
}

/// Aligns `new` against `old` and returns one `DiffOp` per element of the
/// merged walk, in the order a sequential merge would visit them.
///
/// This mirrors the classic `difflib.Differ` algorithm: compute an LCS table,
/// then walk it back to front turning runs of non-matching elements into
/// `Remove`/`Insert` pairs and matching elements into `Keep`.
pub fn lcs_diff<T: PartialEq + Clone>(old: &[T], new: &[T]) -> Vec<(DiffOp, T)> {
    let lengths = lcs_lengths(old, new);
    let mut ops = Vec::new();
    walk_back(&lengths, old, new, old.len(), new.len(), &mut ops);
    ops.reverse();
    ops
}

fn lcs_lengths<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Vec<usize>> {
    let (n, m) = (old.len(), new.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table
}

fn walk_back<T: PartialEq + Clone>(
    table: &[Vec<usize>],
    old: &[T],
    new: &[T],
    i: usize,
    j: usize,
    out: &mut Vec<(DiffOp, T)>,
) {
    if i == old.len() && j == new.len() {
        return;
    }
    if i < old.len() && (j == new.len() || table[i + 1][j] >= table[i][j + 1]) {
        if j < new.len() && old[i] == new[j] {
            out.push((DiffOp::Keep, new[j].clone()));
            return walk_back(table, old, new, i + 1, j + 1, out);
        }
        out.push((DiffOp::Remove, old[i].clone()));
        walk_back(table, old, new, i + 1, j, out)
    } else {
        out.push((DiffOp::Insert, new[j].clone()));
        walk_back(table, old, new, i, j + 1, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_are_all_keeps() {
        let seq = vec!["a", "b", "c"];
        let ops = lcs_diff(&seq, &seq);
        assert!(ops.iter().all(|(op, _)| *op == DiffOp::Keep));
    }

    #[test]
    fn inserts_a_stop_in_the_middle() {
        let old = vec!["a", "c"];
        let new = vec!["a", "b", "c"];
        let ops = lcs_diff(&old, &new);
        assert_eq!(
            ops,
            vec![
                (DiffOp::Keep, "a"),
                (DiffOp::Insert, "b"),
                (DiffOp::Keep, "c"),
            ]
        );
    }
}
