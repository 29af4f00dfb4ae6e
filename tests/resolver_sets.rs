use std::collections::BTreeSet;
use std::path::PathBuf;

use buildstamp::errors::BuildstampError;
use buildstamp::fs::mock::{ListingOrder, MockFileSystem};
use buildstamp::source::{PatternList, SourceTree, list_candidates, resolve, resolve_candidates};
use buildstamp_test_utils::init_tracing;

fn candidates(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn lists(include: &[&str], exclude: &[&str]) -> (PatternList, PatternList) {
    (
        PatternList::compile(include).unwrap(),
        PatternList::compile(exclude).unwrap(),
    )
}

fn project(order: ListingOrder) -> MockFileSystem {
    let fs = MockFileSystem::new().with_listing_order(order);
    fs.add_file("/repo/rag/server.py", b"app".to_vec());
    fs.add_file("/repo/rag/rag.py", b"chain".to_vec());
    fs.add_file("/repo/rag/tests/test_endpoints.py", b"def test(): ...".to_vec());
    fs.add_file("/repo/rag/__pycache__/rag.cpython-312.pyc", b"\x00".to_vec());
    fs.add_file("/repo/rag/Dockerfile", b"FROM python".to_vec());
    fs.add_file("/repo/ingest/section_processor.py", b"split".to_vec());
    fs
}

#[test]
fn union_of_includes_minus_union_of_excludes() {
    init_tracing();

    let all = candidates(&[
        "Dockerfile",
        "rag.py",
        "server.py",
        "tests/test_endpoints.py",
        "__pycache__/rag.cpython-312.pyc",
    ]);
    let (include, exclude) = lists(&["**/*.py", "Dockerfile"], &["tests/**", "**/__pycache__/**"]);

    let set = resolve_candidates(&all, &include, &exclude);
    assert_eq!(set.paths(), ["Dockerfile", "rag.py", "server.py"]);
}

#[test]
fn overlapping_includes_do_not_duplicate() {
    let all = candidates(&["a.py", "b.py"]);
    let (include, exclude) = lists(&["*.py", "a.py", "**"], &[]);

    let set = resolve_candidates(&all, &include, &exclude);
    assert_eq!(set.paths(), ["a.py", "b.py"]);
}

#[test]
fn include_matching_nothing_contributes_nothing() {
    let all = candidates(&["a.py"]);
    let (include, exclude) = lists(&["*.rs", "*.py"], &["*.md"]);

    let set = resolve_candidates(&all, &include, &exclude);
    assert_eq!(set.paths(), ["a.py"]);
}

#[test]
fn single_star_does_not_cross_directories() {
    let all = candidates(&["top.py", "pkg/nested.py"]);
    let (include, exclude) = lists(&["*.py"], &[]);
    assert_eq!(resolve_candidates(&all, &include, &exclude).paths(), ["top.py"]);

    let (include, exclude) = lists(&["**/*.py"], &[]);
    assert_eq!(
        resolve_candidates(&all, &include, &exclude).paths(),
        ["pkg/nested.py", "top.py"]
    );
}

#[test]
fn double_star_prefix_matches_root_level_files() {
    let all = candidates(&["a.txt", "b.txt", "sub/b.txt"]);
    let (include, exclude) = lists(&["**"], &["**/b.txt"]);

    assert_eq!(resolve_candidates(&all, &include, &exclude).paths(), ["a.txt"]);
}

#[test]
fn result_is_byte_lexicographic() {
    let all = candidates(&["b", "B", "a/z", "a-b", "_x"]);
    let (include, exclude) = lists(&["**"], &[]);

    let set = resolve_candidates(&all, &include, &exclude);
    assert_eq!(set.paths(), ["B", "_x", "a-b", "a/z", "b"]);
}

#[test]
fn listing_order_does_not_change_the_file_set() {
    init_tracing();

    let tree = SourceTree::new("rag", "/repo/rag")
        .with_include(["**/*.py", "Dockerfile"])
        .with_exclude(["**/__pycache__/**", "tests/**"]);

    let forward = resolve(&project(ListingOrder::Insertion), &tree).unwrap();
    let backward = resolve(&project(ListingOrder::Reversed), &tree).unwrap();

    assert_eq!(forward, backward);
    assert_eq!(forward.paths(), ["Dockerfile", "rag.py", "server.py"]);
}

#[test]
fn resolving_twice_is_idempotent() {
    let fs = project(ListingOrder::Insertion);
    let tree = SourceTree::new("rag", "/repo/rag");

    let first = resolve(&fs, &tree).unwrap();
    let second = resolve(&fs, &tree).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[test]
fn sibling_trees_stay_inside_their_root() {
    let fs = project(ListingOrder::Insertion);
    let set = resolve(&fs, &SourceTree::new("ingest", "/repo/ingest")).unwrap();

    assert_eq!(set.paths(), ["section_processor.py"]);
    assert!(!set.contains("server.py"));
}

#[test]
fn missing_directory_is_source_unavailable() {
    let fs = project(ListingOrder::Insertion);

    match resolve(&fs, &SourceTree::new("gone", "/repo/does-not-exist")) {
        Err(BuildstampError::SourceUnavailable { path, .. }) => {
            assert_eq!(path, PathBuf::from("/repo/does-not-exist"));
        }
        other => panic!("expected SourceUnavailable, got {:?}", other),
    }
}

#[test]
fn file_as_root_is_source_unavailable() {
    let fs = project(ListingOrder::Insertion);

    let result = resolve(&fs, &SourceTree::new("file", "/repo/rag/rag.py"));
    assert!(matches!(result, Err(BuildstampError::SourceUnavailable { .. })));
}

#[test]
fn unlistable_subdirectory_is_source_unavailable() {
    let fs = project(ListingOrder::Insertion);
    fs.deny_listing("/repo/rag/tests");

    match list_candidates(&fs, &PathBuf::from("/repo/rag")) {
        Err(BuildstampError::SourceUnavailable { path, reason }) => {
            assert_eq!(path, PathBuf::from("/repo/rag/tests"));
            assert!(reason.contains("Permission denied"));
        }
        other => panic!("expected SourceUnavailable, got {:?}", other),
    }
}

#[test]
fn malformed_pattern_is_invalid_pattern_even_without_directory() {
    let tree = SourceTree::new("bad", "/nowhere").with_include(["src/[a-"]);

    match resolve(&MockFileSystem::new(), &tree) {
        Err(BuildstampError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "src/[a-"),
        other => panic!("expected InvalidPattern, got {:?}", other),
    }

    let tree = SourceTree::new("bad", "/nowhere").with_exclude(["{unclosed"]);
    assert!(matches!(
        resolve(&MockFileSystem::new(), &tree),
        Err(BuildstampError::InvalidPattern { .. })
    ));
}

#[test]
fn symlinks_are_not_followed() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/app/main.py", b"x".to_vec());
    fs.add_symlink("/repo/app/shared", "/etc");
    fs.add_symlink("/repo/app/link.py", "/repo/app/main.py");

    let set = resolve(&fs, &SourceTree::new("app", "/repo/app")).unwrap();
    assert_eq!(set.paths(), ["main.py"]);
}
