use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value as JsonValue};
use telepath::pack::{Result, Value};

/// Outcome of reaching a shared instance during one rendering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
	/// First time this instance is reached; carries its new label.
	First(usize),
	/// Instance is an ancestor of the current position.
	Cycle(usize),
	/// Instance was fully rendered earlier in the pass.
	Repeat(usize),
}

/// Labels shared instances in first-visit order and tracks the open path.
#[derive(Debug, Default)]
pub(crate) struct SeenInstances {
	labels: HashMap<usize, usize>,
	open: HashSet<usize>,
}

impl SeenInstances {
	/// Record that rendering reached the instance at `addr`.
	pub(crate) fn enter(&mut self, addr: usize) -> Visit {
		if let Some(label) = self.labels.get(&addr) {
			return if self.open.contains(&addr) { Visit::Cycle(*label) } else { Visit::Repeat(*label) };
		}

		let label = self.labels.len() + 1;
		self.labels.insert(addr, label);
		self.open.insert(addr);
		Visit::First(label)
	}

	/// Record that rendering finished the instance at `addr`.
	pub(crate) fn leave(&mut self, addr: usize) {
		self.open.remove(&addr);
	}

	/// Number of distinct instances labeled so far.
	pub(crate) fn len(&self) -> usize {
		self.labels.len()
	}
}

/// Print a serializable payload as pretty JSON on stdout.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(payload)?);
	Ok(())
}

/// Render a live value as JSON, replacing revisits with `{"$cycle": n}` or `{"$repeat": n}`.
///
/// Records use the same `{"_type": .., "_args": [..]}` shape as
/// [`Value::to_json`]; other objects render as `{"_type": ..}` alone. Labels
/// count shared instances in depth-first order starting at 1, matching the
/// `#n` labels of the text tree.
pub(crate) fn value_to_json_value(value: &Value, seen: &mut SeenInstances) -> JsonValue {
	let Some(addr) = value.instance_addr() else {
		return match value {
			Value::Bool(v) => JsonValue::Bool(*v),
			Value::Number(v) => JsonValue::Number(v.clone()),
			Value::String(v) => JsonValue::String(v.to_string()),
			_ => JsonValue::Null,
		};
	};

	match seen.enter(addr) {
		Visit::Cycle(label) => return marker("$cycle", label),
		Visit::Repeat(label) => return marker("$repeat", label),
		Visit::First(_) => {}
	}

	let out = match value {
		Value::List(list) => JsonValue::Array(list.items().iter().map(|item| value_to_json_value(item, seen)).collect()),
		Value::Dict(dict) => {
			let entries: Map<String, JsonValue> = dict
				.entries()
				.iter()
				.map(|(key, item)| (key.to_string(), value_to_json_value(item, seen)))
				.collect();
			JsonValue::Object(entries)
		}
		Value::Object(object) => {
			let mut out = Map::new();
			out.insert("_type".to_owned(), serde_json::json!(object.type_name()));
			if let Some(record) = object.as_record() {
				let args: Vec<JsonValue> = record.args.iter().map(|item| value_to_json_value(item, seen)).collect();
				out.insert("_args".to_owned(), JsonValue::Array(args));
			}
			JsonValue::Object(out)
		}
		_ => JsonValue::Null,
	};

	seen.leave(addr);
	out
}

fn marker(key: &str, label: usize) -> JsonValue {
	let mut out = Map::new();
	out.insert(key.to_owned(), serde_json::json!(label));
	JsonValue::Object(out)
}
