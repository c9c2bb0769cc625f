//! Inheritance and search scenarios through the public API

use tame::{
    calculate_scc_parent_keyvals, search, AndMatcher, Handle, KeyValueMatcher, MatchType, Matcher,
    MetadataCache, RecordIdentity, Value, ROOT_MARKER,
};

use crate::common::TestRepo;

fn open(repo: &TestRepo) -> MetadataCache {
    MetadataCache::open(&repo.path().join(ROOT_MARKER)).unwrap()
}

fn handle_of(cache: &MetadataCache, path: &str) -> Handle {
    cache.handle_for_path(path).unwrap()
}

#[test]
fn test_inherited_maps_keep_ancestors_whole() {
    let repo = TestRepo::catalog();
    repo.add_record("grand.yaml", "project", "grand", &[], "color: red\nsize: 1\n")
        .add_record("parent.yaml", "project", "parent", &["grand.yaml"], "color: blue\n")
        .add_record("child.yaml", "sample", "child", &["parent.yaml"], "");
    let mut cache = open(&repo);
    let keyvals = calculate_scc_parent_keyvals(&mut cache);

    let inherited = keyvals.for_handle(handle_of(&cache, "child.yaml"));
    assert_eq!(inherited.len(), 2);
    let grand = &inherited[&RecordIdentity::new("project", "grand", "")];
    let parent = &inherited[&RecordIdentity::new("project", "parent", "")];
    // Same key from two ancestors: both kept, neither overwritten
    assert_eq!(grand["color"], Value::from("red"));
    assert_eq!(parent["color"], Value::from("blue"));
    assert_eq!(grand["size"], Value::Integer(1));

    assert!(keyvals.for_handle(handle_of(&cache, "grand.yaml")).is_empty());
}

#[test]
fn test_cycle_members_share_one_map() {
    let repo = TestRepo::catalog();
    repo.add_record("a.yaml", "node", "a", &["b.yaml"], "k: a\n")
        .add_record("b.yaml", "node", "b", &["a.yaml", "root.yaml"], "k: b\n")
        .add_record("root.yaml", "node", "root", &[], "k: root\n");
    let mut cache = open(&repo);
    let keyvals = calculate_scc_parent_keyvals(&mut cache);

    let a = handle_of(&cache, "a.yaml");
    let b = handle_of(&cache, "b.yaml");
    assert_eq!(keyvals.scc.component(a), keyvals.scc.component(b));
    assert_eq!(keyvals.for_handle(a), keyvals.for_handle(b));
    assert!(keyvals
        .for_handle(a)
        .contains_key(&RecordIdentity::new("node", "root", "")));
}

#[test]
fn test_search_through_inheritance() {
    let repo = TestRepo::catalog();
    repo.with_lab_layout();
    let mut cache = open(&repo);

    let matchers: Vec<Box<dyn Matcher>> = vec![
        Box::new(KeyValueMatcher::new(Some("type".into()), "run", true, MatchType::Equal).unwrap()),
        Box::new(
            KeyValueMatcher::new(Some("started".into()), "2020-01-01", true, MatchType::Greater)
                .unwrap(),
        ),
    ];
    let hits = search(&mut cache, &AndMatcher::new(matchers));
    assert_eq!(hits.len(), 1);
    assert_eq!(cache.relative_path(hits[0]), std::path::Path::new("runs/r1/run.yaml"));
}
