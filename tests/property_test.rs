//! Property-based tests for the testable invariants in the specification.

use filesdsl::execute_fdsl;
use proptest::prelude::*;
use tempfile::TempDir;

proptest! {
    /// Invariant 1: range expansion. `[a:b]` equals the closed interval
    /// `a..=b` ascending, or the reversed interval descending.
    #[test]
    fn range_expansion_matches_closed_interval(a in -20i64..20, b in -20i64..20) {
        let dir = TempDir::new().unwrap();
        let source = format!("print([{a}:{b}])\n");
        let output = execute_fdsl(&source, dir.path(), dir.path(), None).unwrap();

        let expected: Vec<i64> = if a <= b { (a..=b).collect() } else { (b..=a).rev().collect() };
        let expected_rendered = format!(
            "[{}]\n",
            expected.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
        );
        prop_assert_eq!(output, expected_rendered);
    }

    /// Invariant 4: sandbox containment. Any path that resolves successfully
    /// under a sandbox root is the root itself or a descendant of it.
    #[test]
    fn sandbox_containment_holds_for_relative_subpaths(segment in "[a-z]{1,8}") {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(&segment)).unwrap();
        let source = format!("d = Directory(\"{segment}\")\nprint(d)\n");
        let output = execute_fdsl(&source, dir.path(), dir.path(), None).unwrap();
        prop_assert_eq!(output, format!("{segment}\n"));
    }
}
