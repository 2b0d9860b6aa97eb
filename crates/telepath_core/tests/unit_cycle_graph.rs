#![allow(missing_docs)]

use std::sync::Arc;

use telepath::pack::{PackedNode, UnpackOptions, Unpacker, Value, scan_for_ids};
use telepath_testkit::fixture_json;

#[test]
fn parent_child_cycle_resolves_to_shared_instances() {
	let unpacker = Unpacker::new();
	let value = unpacker.unpack_json(&fixture_json("cycle.json")).expect("cycle fixture unpacks");
	let top = value.as_dict().expect("top-level dict");

	let root = top.get("root").expect("root");
	let root_dict = root.as_dict().expect("root dict");
	assert!(root_dict.get("self").expect("self").same_instance(&root));

	let children = root_dict.get("children").expect("children");
	assert!(top.get("all").expect("all").same_instance(&children));

	let leaf = children.as_list().and_then(|list| list.get(0)).expect("leaf");
	let leaves = top.get("leaves").expect("leaves");
	assert!(leaves.as_list().and_then(|list| list.get(0)).expect("first leaf").same_instance(&leaf));

	let parent = leaf.as_dict().and_then(|dict| dict.get("parent")).expect("parent");
	assert!(parent.same_instance(&root));
	assert_eq!(leaf.as_dict().and_then(|dict| dict.get("name")).as_ref().and_then(Value::as_str), Some("leaf"));

	assert!(format!("{value:?}").contains("<cycle>"));
	root_dict.clear();
}

#[test]
fn list_containing_itself() {
	let unpacker = Unpacker::new();
	let value = unpacker.unpack_str(r#"{"_list": [1, {"_ref": 9}], "_id": 9}"#).expect("unpacks");

	let list = value.as_list().expect("list");
	assert_eq!(list.len(), 2);
	assert!(list.get(1).expect("second").same_instance(&value));
	list.clear();
}

#[test]
fn scan_visits_shared_subtree_once_regardless_of_fan_in() {
	let leaf_count = 64;
	let subtree = Arc::new(PackedNode::list((0..leaf_count).map(|n| PackedNode::from(n as i64))).with_identity(1));

	let mut visits = Vec::new();
	for fan_in in [1_usize, 8, 512] {
		let mut items = vec![subtree.clone(); fan_in];
		items.extend((0..fan_in).map(|_| Arc::new(PackedNode::reference(1))));
		let tree = PackedNode::List { id: None, items };

		let table = scan_for_ids(&tree, &UnpackOptions::default()).expect("scan succeeds");
		visits.push(table.visited() - fan_in);

		let value = Unpacker::new().unpack(&tree).expect("unpacks");
		let list = value.as_list().expect("list");
		let first = list.get(0).expect("first");
		assert!(list.items().iter().all(|item| item.same_instance(&first)));
	}

	assert!(visits.iter().all(|count| *count == 1 + 1 + leaf_count), "visits={visits:?}");
}
