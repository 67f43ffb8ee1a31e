//! ASCII rendering of heap forests
//!
//! ```text
//! T0----(1, "a")
//! |    S0----(2, "b")
//! |    |    S0----(4, "d")
//! |    S1----(3, "c")
//! ```

use std::fmt::Debug;

use crate::storage::NodeKey;

const EMPTY: &str = "Nothing\n";
const BRANCH: &str = "|    ";

/// Renders the trees rooted at `roots`, each paired with its `T` label.
///
/// `children` lists a node's children left to right; `entry` yields its
/// key and value. Traversal uses an explicit stack, so deep trees are fine.
pub(crate) fn render<'a, K, V, C, E>(roots: &[(usize, NodeKey)], children: C, entry: E) -> String
where
    K: Debug + 'a,
    V: Debug + 'a,
    C: Fn(NodeKey) -> Vec<NodeKey>,
    E: Fn(NodeKey) -> (&'a K, &'a V),
{
    if roots.is_empty() {
        return EMPTY.to_string();
    }

    let mut out = String::new();
    // (indent, prefix, node); pushed in reverse so output runs left to right.
    let mut stack: Vec<(String, String, NodeKey)> = roots
        .iter()
        .rev()
        .map(|&(label, root)| (String::new(), format!("T{label}"), root))
        .collect();

    while let Some((indent, prefix, node)) = stack.pop() {
        let (key, value) = entry(node);
        out.push_str(&format!("{indent}{prefix}----({key:?}, {value:?})\n"));

        let child_indent = format!("{indent}{BRANCH}");
        for (i, child) in children(node).into_iter().enumerate().rev() {
            stack.push((child_indent.clone(), format!("S{i}"), child));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Arena;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_nested() {
        // (key, value, children)
        let mut arena: Arena<(i32, &str, Vec<NodeKey>)> = Arena::with_capacity(5);
        let d = arena.insert((4, "d", vec![]));
        let b = arena.insert((2, "b", vec![d]));
        let c = arena.insert((3, "c", vec![]));
        let a = arena.insert((1, "a", vec![b, c]));
        let e = arena.insert((5, "e", vec![]));

        let out = render(&[(0, a), (2, e)], |k| arena[k].2.clone(), |k| (&arena[k].0, &arena[k].1));
        let expected = "\
T0----(1, \"a\")
|    S0----(2, \"b\")
|    |    S0----(4, \"d\")
|    S1----(3, \"c\")
T2----(5, \"e\")
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_empty() {
        let arena: Arena<(i32, i32)> = Arena::with_capacity(5);
        let out = render(&[], |_| Vec::new(), |k| (&arena[k].0, &arena[k].1));
        assert_eq!(out, "Nothing\n");
    }
}
