//! Integration tests for tree models following a live group tree.

use std::sync::Arc;

use parking_lot::Mutex;
use zkanji_groups::model::{
    CheckState, CheckedGroupTreeModel, GroupNode, GroupTreeModel, ItemRole, ModelIndex,
};
use zkanji_groups::{GroupSettings, Groups, Words, WordGroups};

fn settings() -> GroupSettings {
    GroupSettings {
        show_placeholders: false,
        ..GroupSettings::default()
    }
}

fn names(model: &GroupTreeModel<Words>, tree: &WordGroups, parent: &ModelIndex) -> Vec<String> {
    (0..model.row_count(tree, parent))
        .filter_map(|row| {
            let index = model.index(tree, row, parent);
            model.data(tree, &index, ItemRole::Display).into_string()
        })
        .collect()
}

#[test]
fn test_model_matches_fresh_model_after_edits() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    for path in ["Food/Fruit", "Food/Drinks", "Verbs/Godan", "Loose"] {
        tree.group_from_encoded_name(root, path, true).unwrap();
    }
    tree.add_category(root, "Empty").unwrap();

    let model = GroupTreeModel::new(&tree, &settings(), true);
    let food_index = model.index_of(&tree, GroupNode::Category(tree.category_at(root, 0).unwrap()));
    assert_eq!(names(&model, &tree, &food_index), ["Fruit", "Drinks"]);

    let food = tree.category_at(root, 0).unwrap();
    let verbs = tree.category_at(root, 1).unwrap();
    let fruit = tree.group_at(food, 0).unwrap();
    let drinks = tree.group_at(food, 1).unwrap();

    tree.move_groups(&[fruit, drinks], verbs, 0).unwrap();
    tree.move_category(verbs, root, 3).unwrap();
    tree.add_group(food, "Sweets").unwrap();
    tree.rename_group(tree.group_at(root, 0).unwrap(), "Misc").unwrap();

    let fresh = GroupTreeModel::new(&tree, &settings(), true);
    let top = ModelIndex::invalid();
    assert_eq!(names(&model, &tree, &top), names(&fresh, &tree, &top));
    assert_eq!(names(&model, &tree, &top), ["Food", "Empty", "Verbs", "Misc"]);

    let verbs_index = model.index_of(&tree, GroupNode::Category(verbs));
    assert_eq!(names(&model, &tree, &verbs_index), ["Fruit", "Drinks", "Godan"]);
    assert_eq!(names(&model, &tree, &food_index), ["Sweets"]);
}

#[test]
fn test_model_resets_when_groups_reload() {
    let mut groups = Groups::new();
    let root = groups.words().root();
    groups
        .words_mut()
        .group_from_encoded_name(root, "A/B", true)
        .unwrap();

    let mut buf = Vec::new();
    groups.save(&mut buf).unwrap();
    groups.words_mut().clear();

    let model = GroupTreeModel::new(groups.words(), &settings(), true);
    assert_eq!(model.row_count(groups.words(), &ModelIndex::invalid()), 0);

    let resets = Arc::new(Mutex::new(0));
    let counter = resets.clone();
    model
        .signals()
        .model_reset
        .connect(move |_| *counter.lock() += 1);

    groups.load(&mut buf.as_slice()).unwrap();
    assert_eq!(*resets.lock(), 1);
    assert_eq!(names(&model, groups.words(), &ModelIndex::invalid()), ["A"]);
}

#[test]
fn test_checked_model_collects_selection() {
    let mut tree = WordGroups::new();
    let root = tree.root();
    let n5 = tree.group_from_encoded_name(root, "JLPT/N5", true).unwrap();
    let n4 = tree.group_from_encoded_name(root, "JLPT/N4", true).unwrap();
    let food = tree.group_from_encoded_name(root, "Food", true).unwrap();
    let jlpt = tree.find_category_by_encoded_name(root, "JLPT").unwrap();

    let model = CheckedGroupTreeModel::new(&tree, &settings(), true);

    let changed = Arc::new(Mutex::new(Vec::new()));
    let log = changed.clone();
    model
        .signals()
        .data_changed
        .connect(move |(index, _, roles)| log.lock().push((index.row(), roles.clone())));

    let jlpt_index = model.index_of(&tree, GroupNode::Category(jlpt));
    model.row_count(&tree, &jlpt_index);
    model.set_checked(&tree, GroupNode::Group(n4), true);

    // N4 itself, then its category.
    assert_eq!(
        *changed.lock(),
        vec![(1, vec![ItemRole::CheckState]), (0, vec![ItemRole::CheckState])]
    );
    assert_eq!(
        model.data(&tree, &jlpt_index, ItemRole::CheckState).as_check_state(),
        Some(CheckState::PartiallyChecked)
    );

    model.set_checked(&tree, GroupNode::Group(food), true);
    assert_eq!(model.checked_groups(&tree), vec![n4, food]);

    tree.move_group(n4, root, 1).unwrap();
    assert_eq!(model.checked_groups(&tree), vec![food, n4]);
    assert!(!model.is_checked(n5));

    let index = model.index_of(&tree, GroupNode::Group(n4));
    assert_eq!(model.node_at(&index), Some(GroupNode::Group(n4)));
    assert!(model.flags(&tree, &index).checkable);
}
