use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use crate::pack::{Object, TelepathError, UnpackOptions, Unpacker, Value};

fn widget_unpacker() -> Unpacker {
	let mut unpacker = Unpacker::new();
	unpacker.registry_mut().register_record("Label");
	unpacker.registry_mut().register_record("Panel");
	unpacker
}

#[test]
fn reference_free_tree_unpacks_deterministically() {
	let unpacker = widget_unpacker();
	let packed = json!({
		"title": "Settings",
		"children": [{"_type": "Label", "_args": ["Name", {"bold": true}]}, {"_type": "Label", "_args": ["Email"]}],
		"count": 2,
	});

	let first = unpacker.unpack_json(&packed).expect("unpacks").to_json().expect("plain");
	let second = unpacker.unpack_json(&packed).expect("unpacks").to_json().expect("plain");
	assert_eq!(first, second);
	assert_eq!(first["children"][0], json!({"_type": "Label", "_args": ["Name", {"bold": true}]}));
}

#[test]
fn self_nesting_plus_sibling_reference_share_one_container() {
	let unpacker = Unpacker::new();
	let value = unpacker
		.unpack_str(r#"{"outer": {"_list": [{"_ref": 1}], "_id": 1}, "sibling": {"_ref": 1}}"#)
		.expect("unpacks");

	let dict = value.as_dict().expect("dict");
	let outer = dict.get("outer").expect("outer");
	let sibling = dict.get("sibling").expect("sibling");
	let inner = outer.as_list().and_then(|list| list.get(0)).expect("inner");

	assert!(outer.same_instance(&sibling));
	assert!(outer.same_instance(&inner));
	outer.as_list().expect("list").clear();
}

#[test]
fn registration_overwrite_affects_later_calls_only() {
	let mut unpacker = Unpacker::new();
	unpacker.register("A", |_| Ok(Value::from("first")));
	let before = unpacker.unpack_json(&json!({"_type": "A"})).expect("unpacks");

	unpacker.register("A", |_| Ok(Value::from("second")));
	let after = unpacker.unpack_json(&json!({"_type": "A"})).expect("unpacks");

	assert_eq!(before.as_str(), Some("first"));
	assert_eq!(after.as_str(), Some("second"));
}

#[test]
fn unpackers_disagree_independently() {
	let mut left = Unpacker::new();
	let mut right = Unpacker::new();
	left.register("Thing", |_| Ok(Value::from(1_i64)));
	right.register("Thing", |_| Ok(Value::from(2_i64)));

	let packed = json!({"_type": "Thing"});
	assert_eq!(left.unpack_json(&packed).expect("unpacks").as_i64(), Some(1));
	assert_eq!(right.unpack_json(&packed).expect("unpacks").as_i64(), Some(2));
}

#[test]
fn duplicate_identity_aborts_before_any_construction() {
	let mut unpacker = Unpacker::new();
	unpacker.register("Boom", |_| panic!("constructor must not run"));

	let err = unpacker
		.unpack_json(&json!([{"_type": "Boom", "_id": 1}, {"_list": [], "_id": 1}]))
		.expect_err("duplicate rejected");
	assert!(matches!(err, TelepathError::DuplicateIdentity { .. }));
}

#[test]
fn malformed_input_is_reported_before_unpacking() {
	let unpacker = Unpacker::new();
	assert!(matches!(unpacker.unpack_str("{not json"), Err(TelepathError::Json(_))));
	assert!(matches!(
		unpacker.unpack_json(&json!({"_ref": "x"})),
		Err(TelepathError::MalformedNode { .. })
	));
}

#[test]
fn options_are_applied() {
	let unpacker = Unpacker::with_options(UnpackOptions { max_depth: 3 });
	assert_eq!(unpacker.options().max_depth, 3);
	assert!(matches!(
		unpacker.unpack_json(&json!([[[[1]]]])),
		Err(TelepathError::DepthExceeded { max_depth: 3 })
	));
}

#[test]
fn one_unpacker_serves_many_threads() {
	let unpacker = widget_unpacker();
	let packed = json!({"_type": "Panel", "_args": [{"_list": [{"_type": "Label", "_args": ["x"]}], "_id": 1}, {"_ref": 1}]});

	std::thread::scope(|scope| {
		let handles: Vec<_> = (0..4)
			.map(|_| {
				scope.spawn(|| {
					let value = unpacker.unpack_json(&packed).expect("unpacks");
					let record = value.as_object().and_then(|object| object.as_record()).expect("record");
					assert!(record.args[0].same_instance(&record.args[1]));
					value.to_json().expect("plain")
				})
			})
			.collect();

		for handle in handles {
			let rendered = handle.join().expect("thread joins");
			assert_eq!(rendered["_args"][1], json!([{"_type": "Label", "_args": ["x"]}]));
		}
	});
}

static TRACKERS_DROPPED: AtomicUsize = AtomicUsize::new(0);

struct Tracker;

impl Drop for Tracker {
	fn drop(&mut self) {
		TRACKERS_DROPPED.fetch_add(1, Ordering::SeqCst);
	}
}

#[test]
fn dropping_a_cyclic_result_frees_it() {
	let mut unpacker = Unpacker::new();
	unpacker.register("Tracker", |_| Ok(Value::Object(Object::new("Tracker", Tracker))));

	for _ in 0..1000 {
		let value = unpacker
			.unpack_str(r#"{"_list": [{"_type": "Tracker"}, {"_ref": 1}], "_id": 1}"#)
			.expect("unpacks");
		let list = value.as_list().expect("list");
		assert!(list.is_back_edge(1));
		assert!(list.get(1).expect("self").same_instance(&value));
	}

	assert_eq!(TRACKERS_DROPPED.load(Ordering::SeqCst), 1000);
}

fn flat_reference_chain(len: u32) -> String {
	let mut entries = vec![r#"{"_list": [], "_id": 0}"#.to_owned()];
	for id in 1..len {
		entries.push(format!(r#"{{"_list": [{{"_ref": {}}}], "_id": {id}}}"#, id - 1));
	}
	format!("[{}]", entries.join(","))
}

#[test]
fn flat_reference_chain_cannot_nest_past_depth_limit() {
	let unpacker = Unpacker::with_options(UnpackOptions::for_untrusted_input());

	let err = unpacker.unpack_str(&flat_reference_chain(100_000)).expect_err("chain nests too deep");
	assert!(matches!(err, TelepathError::DepthExceeded { max_depth: 64 }));

	let value = unpacker.unpack_str(&flat_reference_chain(40)).expect("short chain unpacks");
	let mut current = value.as_list().and_then(|list| list.get(39)).expect("last entry");
	for _ in 0..39 {
		let inner = current.as_list().and_then(|list| list.get(0)).expect("nested entry");
		current = inner;
	}
	assert_eq!(current.as_list().map(|list| list.len()), Some(0));
}
