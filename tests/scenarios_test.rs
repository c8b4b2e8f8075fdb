//! End-to-end scenario tests driven through the embedding API, plus the
//! cross-cutting invariants from the testable-properties list.

use std::fs;
use std::time::Duration;

use filesdsl::{execute_fdsl, DslError};
use tempfile::TempDir;

#[test]
fn s3_table_of_contents_from_text_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("toc.txt"),
        "1 Intro ....... 1\n1.1 Scope ..... 2\n2 Methods .... 5\n",
    )
    .unwrap();

    let output = execute_fdsl("print(File(\"toc.txt\").table())\n", dir.path(), dir.path(), None).unwrap();
    assert!(output.contains("1 Intro (p.1)"));
    assert!(output.contains("  1.1 Scope (p.2)"));
    assert!(output.contains("2 Methods (p.5)"));
}

#[test]
fn s4_sandbox_error_names_path_and_root() {
    let dir = TempDir::new().unwrap();
    let err = execute_fdsl("d = Directory(\"/\")\n", dir.path(), dir.path(), None).unwrap_err();
    match err {
        DslError::Sandbox { path, root } => {
            assert_eq!(path, "/");
            assert_eq!(root, dir.path().canonicalize().unwrap().to_string_lossy());
        }
        other => panic!("expected Sandbox error, got {other:?}"),
    }
}

#[test]
fn s5_prepare_then_delete_preserves_content_access() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("notes.txt"), "alpha\nbeta\n").unwrap();

    let budget = filesdsl::Budget::unbounded();
    filesdsl::prepare_index(dir.path(), &budget).unwrap();
    fs::remove_file(dir.path().join("notes.txt")).unwrap();

    let output = execute_fdsl(
        "print(File(\"notes.txt\").contains(\"alpha\"))\n",
        dir.path(),
        dir.path(),
        None,
    )
    .unwrap();
    assert_eq!(output, "true\n");
}

#[test]
fn s6_timeout_names_evaluator_loop_phase() {
    let dir = TempDir::new().unwrap();
    let err = execute_fdsl(
        "for i in [1:1000000000]:\n    x = i\n",
        dir.path(),
        dir.path(),
        Some(Duration::from_millis(1)),
    )
    .unwrap_err();
    match err {
        DslError::Timeout { elapsed_s, phase, .. } => {
            assert!(elapsed_s < 1.0);
            assert_eq!(phase, "evaluator loop");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[test]
fn print_rendering_uses_display_root_relative_paths() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("x.txt"), "hi\n").unwrap();
    let output = execute_fdsl(
        "print(Directory(\".\"))\nprint(File(\"x.txt\"))\n",
        dir.path(),
        dir.path(),
        None,
    )
    .unwrap();
    assert_eq!(output, ".\nx.txt\n");
}

#[test]
fn chunking_round_trip_matches_joined_read() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("long.txt"), "line\n".repeat(250)).unwrap();

    let output = execute_fdsl(
        "f = File(\"long.txt\")\n\
         whole = f.read()\n\
         n = len(f.search(\".*\"))\n\
         joined = \"\"\n\
         for i in [1:n]:\n\
         \x20   for page in f.read(pages=[i]):\n\
         \x20       if i == 1:\n\
         \x20           joined = page\n\
         \x20       else:\n\
         \x20           joined = joined + \"\\n\\n\" + page\n\
         print(joined == whole)\n",
        dir.path(),
        dir.path(),
        None,
    )
    .unwrap();
    assert_eq!(output, "true\n");
}

#[test]
fn search_and_contains_agree_through_dsl() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha\nbeta\ngamma\n").unwrap();
    let output = execute_fdsl(
        "f = File(\"a.txt\")\n\
         print(f.contains(\"beta\"))\n\
         print(len(f.search(\"beta\")) > 0)\n\
         print(f.contains(\"zzz\"))\n\
         print(len(f.search(\"zzz\")) > 0)\n",
        dir.path(),
        dir.path(),
        None,
    )
    .unwrap();
    assert_eq!(output, "true\ntrue\nfalse\nfalse\n");
}

#[test]
fn tab_indentation_is_a_syntax_error_pinpointing_the_column() {
    let dir = TempDir::new().unwrap();
    let err = execute_fdsl("if true:\n\tx = 1\n", dir.path(), dir.path(), None).unwrap_err();
    match err {
        DslError::Syntax { column, .. } => assert_eq!(column, 1),
        other => panic!("expected Syntax error, got {other:?}"),
    }
}
