use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::pack::{Identity, PackedNode, Result, TelepathError};

const ARGS_KEY: &str = "_args";
const DICT_KEY: &str = "_dict";
const ID_KEY: &str = "_id";
const LIST_KEY: &str = "_list";
const REF_KEY: &str = "_ref";
const TYPE_KEY: &str = "_type";
const VAL_KEY: &str = "_val";

/// Keys with special meaning in the wire format; a compact mapping may not use them.
pub const RESERVED_KEYS: [&str; 7] = [ARGS_KEY, DICT_KEY, ID_KEY, LIST_KEY, REF_KEY, TYPE_KEY, VAL_KEY];

impl PackedNode {
	/// Decode a JSON value in wire format into a packed tree.
	pub fn from_json(value: &Json) -> Result<Self> {
		decode_value(value, &mut Locator::default())
	}

	/// Encode this tree in wire format.
	///
	/// Unlabeled sequences and mappings use the compact JSON array/object form;
	/// everything else uses the tagged form.
	pub fn to_json(&self) -> Json {
		match self {
			Self::Null => Json::Null,
			Self::Bool(value) => Json::Bool(*value),
			Self::Number(value) => Json::Number(value.clone()),
			Self::String(value) => Json::String(value.to_string()),
			Self::Verbatim { id, value } => tagged(*id, [(VAL_KEY, value.clone())]),
			Self::List { id: None, items } => Json::Array(encode_seq(items)),
			Self::List { id, items } => tagged(*id, [(LIST_KEY, Json::Array(encode_seq(items)))]),
			Self::Dict { id, entries } => {
				let map: Map<String, Json> = entries.iter().map(|(key, value)| (key.to_string(), value.to_json())).collect();
				let clashes = entries.keys().any(|key| is_reserved(key));
				if id.is_none() && !clashes {
					Json::Object(map)
				} else {
					tagged(*id, [(DICT_KEY, Json::Object(map))])
				}
			}
			Self::Object { id, type_name, args } => tagged(
				*id,
				[(TYPE_KEY, Json::String(type_name.to_string())), (ARGS_KEY, Json::Array(encode_seq(args)))],
			),
			Self::Ref(id) => tagged(None, [(REF_KEY, Json::from(id.0))]),
		}
	}
}

impl FromStr for PackedNode {
	type Err = TelepathError;

	fn from_str(input: &str) -> Result<Self> {
		let raw: Json = serde_json::from_str(input)?;
		Self::from_json(&raw)
	}
}

impl Serialize for PackedNode {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		self.to_json().serialize(serializer)
	}
}

impl<'de> Deserialize<'de> for PackedNode {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let raw = Json::deserialize(deserializer)?;
		Self::from_json(&raw).map_err(D::Error::custom)
	}
}

/// Return whether `key` has special meaning in the wire format.
pub fn is_reserved(key: &str) -> bool {
	RESERVED_KEYS.contains(&key)
}

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
	Key(&'a str),
	Index(usize),
}

/// Position inside the JSON document, rendered only when reporting errors.
#[derive(Debug, Default)]
struct Locator<'a> {
	segments: Vec<Segment<'a>>,
}

impl<'a> Locator<'a> {
	fn render(&self) -> String {
		let mut out = String::from("$");
		for segment in &self.segments {
			let _ = match segment {
				Segment::Key(key) => write!(out, ".{key}"),
				Segment::Index(index) => write!(out, "[{index}]"),
			};
		}
		out
	}

	fn malformed(&self, reason: &'static str) -> TelepathError {
		TelepathError::MalformedNode { path: self.render(), reason }
	}

	fn malformed_at(&mut self, key: &'a str, reason: &'static str) -> TelepathError {
		self.segments.push(Segment::Key(key));
		let err = self.malformed(reason);
		self.segments.pop();
		err
	}
}

fn decode_value<'a>(value: &'a Json, loc: &mut Locator<'a>) -> Result<PackedNode> {
	match value {
		Json::Null => Ok(PackedNode::Null),
		Json::Bool(value) => Ok(PackedNode::Bool(*value)),
		Json::Number(value) => Ok(PackedNode::Number(value.clone())),
		Json::String(value) => Ok(PackedNode::String(value.as_str().into())),
		Json::Array(items) => Ok(PackedNode::List {
			id: None,
			items: decode_seq(items, loc)?,
		}),
		Json::Object(map) => decode_object(map, loc),
	}
}

fn decode_object<'a>(map: &'a Map<String, Json>, loc: &mut Locator<'a>) -> Result<PackedNode> {
	if let Some(target) = map.get(REF_KEY) {
		reject_extra_keys(map, &[REF_KEY], "`_ref` node cannot carry other keys", loc)?;
		return Ok(PackedNode::Ref(decode_identity(target, REF_KEY, loc)?));
	}

	let id = map.get(ID_KEY).map(|raw| decode_identity(raw, ID_KEY, loc)).transpose()?;

	if let Some(value) = map.get(VAL_KEY) {
		reject_extra_keys(map, &[VAL_KEY, ID_KEY], "`_val` node may only carry `_id`", loc)?;
		return Ok(PackedNode::Verbatim { id, value: value.clone() });
	}

	if let Some(items) = map.get(LIST_KEY) {
		reject_extra_keys(map, &[LIST_KEY, ID_KEY], "`_list` node may only carry `_id`", loc)?;
		let Json::Array(items) = items else {
			return Err(loc.malformed_at(LIST_KEY, "`_list` must be an array"));
		};
		loc.segments.push(Segment::Key(LIST_KEY));
		let items = decode_seq(items, loc)?;
		loc.segments.pop();
		return Ok(PackedNode::List { id, items });
	}

	if let Some(entries) = map.get(DICT_KEY) {
		reject_extra_keys(map, &[DICT_KEY, ID_KEY], "`_dict` node may only carry `_id`", loc)?;
		let Json::Object(entries) = entries else {
			return Err(loc.malformed_at(DICT_KEY, "`_dict` must be an object"));
		};
		loc.segments.push(Segment::Key(DICT_KEY));
		let entries = decode_entries(entries, loc)?;
		loc.segments.pop();
		return Ok(PackedNode::Dict { id, entries });
	}

	if let Some(type_name) = map.get(TYPE_KEY) {
		reject_extra_keys(map, &[TYPE_KEY, ARGS_KEY, ID_KEY], "`_type` node may only carry `_args` and `_id`", loc)?;
		let Json::String(type_name) = type_name else {
			return Err(loc.malformed_at(TYPE_KEY, "`_type` must be a string"));
		};
		let args = match map.get(ARGS_KEY) {
			None => Vec::new(),
			Some(Json::Array(args)) => {
				loc.segments.push(Segment::Key(ARGS_KEY));
				let args = decode_seq(args, loc)?;
				loc.segments.pop();
				args
			}
			Some(_) => return Err(loc.malformed_at(ARGS_KEY, "`_args` must be an array")),
		};
		return Ok(PackedNode::Object {
			id,
			type_name: type_name.as_str().into(),
			args,
		});
	}

	if id.is_some() {
		return Err(loc.malformed("`_id` requires a `_val`, `_list`, `_dict` or `_type` payload"));
	}

	if let Some(key) = map.keys().find(|key| is_reserved(key)) {
		return Err(loc.malformed_at(key, "reserved key in compact mapping; use the `_dict` form"));
	}

	Ok(PackedNode::Dict {
		id: None,
		entries: decode_entries(map, loc)?,
	})
}

fn reject_extra_keys<'a>(map: &'a Map<String, Json>, allowed: &[&str], reason: &'static str, loc: &mut Locator<'a>) -> Result<()> {
	match map.keys().find(|key| !allowed.contains(&key.as_str())) {
		Some(key) => Err(loc.malformed_at(key, reason)),
		None => Ok(()),
	}
}

fn decode_seq<'a>(items: &'a [Json], loc: &mut Locator<'a>) -> Result<Vec<Arc<PackedNode>>> {
	let mut out = Vec::with_capacity(items.len());
	for (index, item) in items.iter().enumerate() {
		loc.segments.push(Segment::Index(index));
		out.push(Arc::new(decode_value(item, loc)?));
		loc.segments.pop();
	}
	Ok(out)
}

fn decode_entries<'a>(entries: &'a Map<String, Json>, loc: &mut Locator<'a>) -> Result<BTreeMap<Box<str>, Arc<PackedNode>>> {
	let mut out = BTreeMap::new();
	for (key, value) in entries {
		loc.segments.push(Segment::Key(key));
		out.insert(key.as_str().into(), Arc::new(decode_value(value, loc)?));
		loc.segments.pop();
	}
	Ok(out)
}

fn decode_identity<'a>(raw: &Json, key: &'a str, loc: &mut Locator<'a>) -> Result<Identity> {
	raw.as_u64()
		.and_then(|value| u32::try_from(value).ok())
		.map(Identity)
		.ok_or_else(|| loc.malformed_at(key, "identity must be a non-negative 32-bit integer"))
}

fn encode_seq(items: &[Arc<PackedNode>]) -> Vec<Json> {
	items.iter().map(|item| item.to_json()).collect()
}

fn tagged<const N: usize>(id: Option<Identity>, fields: [(&str, Json); N]) -> Json {
	let mut map = Map::new();
	for (key, value) in fields {
		map.insert(key.to_owned(), value);
	}
	if let Some(id) = id {
		map.insert(ID_KEY.to_owned(), Json::from(id.0));
	}
	Json::Object(map)
}
