use std::collections::BTreeMap;

use proptest::prelude::*;

use buildstamp::fingerprint::fingerprint_tree;
use buildstamp::fs::mock::{ListingOrder, MockFileSystem};
use buildstamp::source::SourceTree;

const ROOT: &str = "/tree";

// Relative paths built from a small alphabet so that collisions, nesting and
// sibling ordering all show up.
fn rel_path() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-c]{1,2}", 1..4).prop_map(|parts| parts.join("/"))
}

fn tree_contents() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    proptest::collection::btree_map(rel_path(), proptest::collection::vec(any::<u8>(), 0..16), 0..12)
        .prop_map(|mut files| {
            // A path cannot be both a file and a directory.
            let keys: Vec<String> = files.keys().cloned().collect();
            for k in &keys {
                let prefix = format!("{k}/");
                if keys.iter().any(|other| other.starts_with(&prefix)) {
                    files.remove(k);
                }
            }
            files
        })
}

fn mount(files: &BTreeMap<String, Vec<u8>>, order: ListingOrder, reverse_insert: bool) -> MockFileSystem {
    let fs = MockFileSystem::new().with_listing_order(order);
    fs.add_dir(ROOT);
    let mut entries: Vec<_> = files.iter().collect();
    if reverse_insert {
        entries.reverse();
    }
    for (rel, bytes) in entries {
        fs.add_file(format!("{ROOT}/{rel}"), bytes.clone());
    }
    fs
}

fn tree() -> SourceTree {
    SourceTree::new("prop", ROOT).with_exclude(["**/c"])
}

proptest! {
    #[test]
    fn fingerprint_ignores_enumeration_order(files in tree_contents()) {
        let a = fingerprint_tree(&mount(&files, ListingOrder::Insertion, false), &tree()).unwrap();
        let b = fingerprint_tree(&mount(&files, ListingOrder::Reversed, true), &tree()).unwrap();
        prop_assert_eq!(a.files, b.files);
        prop_assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn changing_included_bytes_changes_fingerprint(
        files in tree_contents(),
        pick in any::<prop::sample::Index>(),
        extra in any::<u8>(),
    ) {
        let base = fingerprint_tree(&mount(&files, ListingOrder::Insertion, false), &tree()).unwrap();
        prop_assume!(!base.files.is_empty());

        let target = base.files.paths()[pick.index(base.files.len())].clone();
        let mut changed = files.clone();
        changed.get_mut(&target).unwrap().push(extra);

        let after = fingerprint_tree(&mount(&changed, ListingOrder::Insertion, false), &tree()).unwrap();
        prop_assert_ne!(base.fingerprint, after.fingerprint);
    }

    #[test]
    fn changing_excluded_bytes_never_changes_fingerprint(
        files in tree_contents(),
        junk in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let base = fingerprint_tree(&mount(&files, ListingOrder::Insertion, false), &tree()).unwrap();

        let mut changed = files.clone();
        // "c" as a leaf name is excluded by "**/c"; skip if "c" is a directory.
        prop_assume!(!files.keys().any(|k| k.starts_with("c/")));
        changed.insert("c".to_string(), junk);

        let after = fingerprint_tree(&mount(&changed, ListingOrder::Insertion, false), &tree()).unwrap();
        prop_assert_eq!(base.fingerprint, after.fingerprint);
    }

    #[test]
    fn adding_an_included_file_changes_fingerprint(
        files in tree_contents(),
        bytes in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        // "new.txt" sits at the root and cannot clash with the [a-c] alphabet.
        let base = fingerprint_tree(&mount(&files, ListingOrder::Insertion, false), &tree()).unwrap();

        let mut changed = files.clone();
        changed.insert("new.txt".to_string(), bytes);

        let after = fingerprint_tree(&mount(&changed, ListingOrder::Insertion, false), &tree()).unwrap();
        prop_assert_ne!(base.fingerprint, after.fingerprint);
    }
}
