//! Integration tests for editing group trees through the public API.

use std::sync::Arc;

use parking_lot::Mutex;
use zkanji_core::Range;
use zkanji_groups::{CategoryId, GroupError, Groups, KanjiGroups, NodeRef, WordGroups};

#[test]
fn test_build_from_paths_and_fill_group() {
    let mut tree = WordGroups::new();
    let root = tree.root();

    let g1 = tree.group_from_encoded_name(root, "A/B/G1", true).unwrap();
    let outcome = tree.group_mut(g1).unwrap().add_many(&[3, 1, 4, 1, 5]);
    assert_eq!(outcome.added, 4);
    assert_eq!(outcome.positions, vec![0, 1, 1, 2, 3]);

    let group = tree.group(g1).unwrap();
    assert_eq!(group.indexes(), &[3, 1, 4, 5]);
    assert_eq!(tree.full_encoded_name(g1.into()).as_deref(), Some("A/B/G1"));
    assert_eq!(tree.category_count(), 2);
    assert_eq!(tree.word_groups(1), &[g1]);

    // Resolving again finds the same nodes instead of creating new ones.
    assert_eq!(tree.group_from_encoded_name(root, "a/b/g1", true), Some(g1));
    assert_eq!(tree.category_count(), 2);
    assert_eq!(tree.group_count(), 1);
}

#[test]
fn test_encoded_names_survive_special_characters() {
    let mut tree = KanjiGroups::new();
    let root = tree.root();
    tree.add_category(root, "a/b").unwrap();
    let odd = tree.category_at(root, 0).unwrap();
    tree.add_category(odd, "^up[").unwrap();
    let inner = tree.category_at(odd, 0).unwrap();
    tree.add_group(inner, "x").unwrap();
    let x = tree.group_at(inner, 0).unwrap();

    let path = tree.full_encoded_name(x.into()).unwrap();
    assert_eq!(path, "a^/b/^^up^[/x");
    assert_eq!(tree.find_group_by_encoded_name(root, &path), Some(x));
    assert_eq!(
        tree.find_category_by_encoded_name(root, "a^/b/^^up^["),
        Some(inner)
    );
    assert_eq!(tree.find_group_by_encoded_name(root, "a/b/x"), None);
}

#[test]
fn test_names_are_unique_per_namespace() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    tree.add_category(root, "Verbs").unwrap();
    tree.add_group(root, "verbs").unwrap();

    assert!(matches!(
        tree.add_category(root, "VERBS"),
        Err(GroupError::NameTaken { .. })
    ));
    assert!(matches!(tree.add_group(root, "  "), Err(GroupError::InvalidName)));
    assert!(tree.category_name_taken(root, "verbs"));
    assert_eq!(tree.category_count(), 1);
    assert_eq!(tree.group_count(), 1);
}

#[test]
fn test_batch_group_move_announces_ranges() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    for name in ["g0", "g1", "g2", "g3", "g4"] {
        tree.add_group(root, name).unwrap();
    }
    let ids: Vec<_> = tree.groups(root).to_vec();

    let events = Arc::new(Mutex::new(Vec::new()));
    let log = events.clone();
    tree.signals()
        .groups_moved
        .connect(move |(_, ranges, _, dest, _)| log.lock().push((ranges.clone(), *dest)));

    tree.move_groups(&[ids[3], ids[0], ids[1]], root, 5).unwrap();
    let names: Vec<_> = tree
        .groups(root)
        .iter()
        .map(|id| tree.group(*id).unwrap().name().to_string())
        .collect();
    assert_eq!(names, ["g2", "g4", "g0", "g1", "g3"]);
    assert_eq!(
        *events.lock(),
        vec![(vec![Range::new(0, 1), Range::single(3)], 5)]
    );

    assert!(matches!(
        tree.move_groups(&[ids[2], ids[4]], root, 1),
        Err(GroupError::Range(_))
    ));
}

#[test]
fn test_remove_mixed_selection() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    let g = tree.group_from_encoded_name(root, "Food/Fruit/Apples", true).unwrap();
    let food = tree.find_category_by_encoded_name(root, "Food").unwrap();
    tree.add_group(root, "Loose").unwrap();
    let loose = tree.group_at(root, 0).unwrap();

    tree.remove(&[NodeRef::Group(g), NodeRef::Category(food), NodeRef::Group(loose)])
        .unwrap();
    assert!(tree.is_empty());
    assert!(!tree.contains(g.into()));
    assert!(matches!(
        tree.remove(&[NodeRef::Category(root)]),
        Err(GroupError::RootImmutable)
    ));
}

#[test]
fn test_dictionary_word_removal() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    let a = tree.group_from_encoded_name(root, "A", true).unwrap();
    let b = tree.group_from_encoded_name(root, "B", true).unwrap();
    tree.group_mut(a).unwrap().add_many(&[10, 20, 30]);
    tree.group_mut(b).unwrap().add_many(&[20, 5]);

    let rewritten = Arc::new(Mutex::new(Vec::new()));
    let log = rewritten.clone();
    tree.signals().items_changed.connect(move |id| log.lock().push(*id));

    tree.process_removed_word(20);
    assert_eq!(tree.group(a).unwrap().indexes(), &[10, 29]);
    assert_eq!(tree.group(b).unwrap().indexes(), &[5]);
    assert!(!tree.word_has_groups(30));
    assert_eq!(tree.word_groups(29), &[a]);
    assert_eq!(*rewritten.lock(), vec![a]);
}

fn collect_nodes(tree: &WordGroups, category: CategoryId, out: &mut Vec<NodeRef>) {
    for &child in tree.categories(category) {
        out.push(NodeRef::Category(child));
        collect_nodes(tree, child, out);
    }
    out.extend(tree.groups(category).iter().map(|&g| NodeRef::Group(g)));
}

#[test]
fn test_every_node_resolves_from_its_encoded_name() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    for path in [
        "Food/Fruit/Apples",
        "Food/Fruit/Pears",
        "Food/Drinks",
        "Food",
        "a^/b/^^up^[/x",
        "a^/b/plain",
        "[brackets]/^^",
        "Verbs/Godan/う",
        "Loose",
    ] {
        tree.group_from_encoded_name(root, path, true).unwrap();
    }
    tree.add_category(root, "Empty/ish").unwrap();

    let mut nodes = Vec::new();
    collect_nodes(&tree, root, &mut nodes);
    assert_eq!(nodes.len(), tree.category_count() + tree.group_count());

    for node in nodes {
        let path = tree.full_encoded_name(node).unwrap();
        match node {
            NodeRef::Category(id) => {
                assert_eq!(tree.find_category_by_encoded_name(root, &path), Some(id), "{path}");
                assert_eq!(tree.category_from_encoded_name(root, &path, false), Some(id));
            }
            NodeRef::Group(id) => {
                assert_eq!(tree.find_group_by_encoded_name(root, &path), Some(id), "{path}");
                assert_eq!(tree.group_from_encoded_name(root, &path, true), Some(id));
            }
        }
    }
    assert_eq!(tree.group_count(), 9);
}

#[test]
fn test_ids_do_not_survive_whole_tree_replacement() {
    let mut groups = Groups::new();
    let root = groups.words().root();
    let mine = groups.words_mut().group_from_encoded_name(root, "Mine", true).unwrap();

    groups.words_mut().clear();
    let fresh = groups.words_mut().group_from_encoded_name(root, "New", true).unwrap();
    assert!(groups.words().group(mine).is_none());
    assert_ne!(fresh, mine);

    let mut other = Groups::new();
    let other_root = other.words().root();
    other.words_mut().group_from_encoded_name(other_root, "Copied", true).unwrap();
    groups.copy_from(&other);
    assert!(groups.words().group(fresh).is_none());

    let mut file = Groups::new();
    let file_root = file.words().root();
    file.words_mut().group_from_encoded_name(file_root, "FromFile", true).unwrap();
    let mut buf = Vec::new();
    file.save(&mut buf).unwrap();

    let copied = groups.words().find_group_by_encoded_name(root, "Copied").unwrap();
    groups.load(&mut buf.as_slice()).unwrap();
    assert!(groups.words().group(copied).is_none());
    assert_eq!(groups.words().name(copied.into()), None);

    let loaded = groups.words().find_group_by_encoded_name(root, "FromFile").unwrap();
    assert_eq!(groups.words().group(loaded).map(|g| g.name()), Some("FromFile"));
}
