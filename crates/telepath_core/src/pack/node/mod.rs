use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Number;

/// Label marking a packed node as the target of references elsewhere in the same tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(pub u32);

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<u32> for Identity {
	fn from(value: u32) -> Self {
		Self(value)
	}
}

/// One unit of the packed tree.
///
/// Children are held behind [`Arc`] so one raw node can be reachable from
/// several parents without being duplicated.
#[derive(Debug, Clone, PartialEq)]
pub enum PackedNode {
	/// JSON `null`.
	Null,
	/// Boolean primitive.
	Bool(bool),
	/// Numeric primitive.
	Number(Number),
	/// String primitive.
	String(Box<str>),
	/// Plain JSON passed through without interpretation.
	Verbatim {
		/// Optional identity.
		id: Option<Identity>,
		/// Payload delivered as plain data.
		value: serde_json::Value,
	},
	/// Ordered sequence.
	List {
		/// Optional identity.
		id: Option<Identity>,
		/// Elements in order.
		items: Vec<Arc<PackedNode>>,
	},
	/// String-keyed mapping.
	Dict {
		/// Optional identity.
		id: Option<Identity>,
		/// Entries keyed by unique name.
		entries: BTreeMap<Box<str>, Arc<PackedNode>>,
	},
	/// Value produced by a registered constructor.
	Object {
		/// Optional identity.
		id: Option<Identity>,
		/// Registry name of the constructor.
		type_name: Box<str>,
		/// Constructor arguments, in call order.
		args: Vec<Arc<PackedNode>>,
	},
	/// Pointer to an identified node defined elsewhere.
	Ref(Identity),
}

impl PackedNode {
	/// Build an unlabeled sequence.
	pub fn list(items: impl IntoIterator<Item = PackedNode>) -> Self {
		Self::List {
			id: None,
			items: items.into_iter().map(Arc::new).collect(),
		}
	}

	/// Build an unlabeled mapping.
	pub fn dict<K: Into<Box<str>>>(entries: impl IntoIterator<Item = (K, PackedNode)>) -> Self {
		Self::Dict {
			id: None,
			entries: entries.into_iter().map(|(key, value)| (key.into(), Arc::new(value))).collect(),
		}
	}

	/// Build an unlabeled typed object.
	pub fn object(type_name: impl Into<Box<str>>, args: impl IntoIterator<Item = PackedNode>) -> Self {
		Self::Object {
			id: None,
			type_name: type_name.into(),
			args: args.into_iter().map(Arc::new).collect(),
		}
	}

	/// Build a reference to `id`.
	pub fn reference(id: u32) -> Self {
		Self::Ref(Identity(id))
	}

	/// Build an unlabeled verbatim payload.
	pub fn verbatim(value: serde_json::Value) -> Self {
		Self::Verbatim { id: None, value }
	}

	/// Attach an identity to this node.
	///
	/// Primitives become [`PackedNode::Verbatim`] so they can carry the label.
	/// References cannot be labeled and are returned unchanged.
	pub fn with_identity(self, id: u32) -> Self {
		let id = Some(Identity(id));
		match self {
			Self::Null => Self::Verbatim {
				id,
				value: serde_json::Value::Null,
			},
			Self::Bool(value) => Self::Verbatim {
				id,
				value: serde_json::Value::Bool(value),
			},
			Self::Number(value) => Self::Verbatim {
				id,
				value: serde_json::Value::Number(value),
			},
			Self::String(value) => Self::Verbatim {
				id,
				value: serde_json::Value::String(value.into()),
			},
			Self::Verbatim { value, .. } => Self::Verbatim { id, value },
			Self::List { items, .. } => Self::List { id, items },
			Self::Dict { entries, .. } => Self::Dict { id, entries },
			Self::Object { type_name, args, .. } => Self::Object { id, type_name, args },
			Self::Ref(target) => Self::Ref(target),
		}
	}

	/// Return the identity carried by this node, if any.
	pub fn identity(&self) -> Option<Identity> {
		match self {
			Self::Verbatim { id, .. } | Self::List { id, .. } | Self::Dict { id, .. } | Self::Object { id, .. } => *id,
			_ => None,
		}
	}

	/// Return a stable lowercase label for the node kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::Number(_) => "number",
			Self::String(_) => "string",
			Self::Verbatim { .. } => "verbatim",
			Self::List { .. } => "list",
			Self::Dict { .. } => "dict",
			Self::Object { .. } => "object",
			Self::Ref(_) => "ref",
		}
	}

	/// Return the constructor name for typed objects.
	pub fn type_name(&self) -> Option<&str> {
		match self {
			Self::Object { type_name, .. } => Some(type_name),
			_ => None,
		}
	}

	/// Iterate direct children: sequence elements, mapping values, or constructor arguments.
	pub fn children(&self) -> Box<dyn Iterator<Item = &Arc<PackedNode>> + '_> {
		match self {
			Self::List { items, .. } | Self::Object { args: items, .. } => Box::new(items.iter()),
			Self::Dict { entries, .. } => Box::new(entries.values()),
			_ => Box::new(std::iter::empty()),
		}
	}

	/// Collect every distinct constructor name used in this tree.
	pub fn type_names(&self) -> BTreeSet<&str> {
		let mut names = BTreeSet::new();
		let mut seen: HashSet<*const PackedNode> = HashSet::new();
		let mut stack = vec![self];

		while let Some(node) = stack.pop() {
			if !seen.insert(node as *const PackedNode) {
				continue;
			}
			if let Some(name) = node.type_name() {
				names.insert(name);
			}
			stack.extend(node.children().map(|child| child.as_ref()));
		}

		names
	}
}

impl From<bool> for PackedNode {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<i64> for PackedNode {
	fn from(value: i64) -> Self {
		Self::Number(value.into())
	}
}

impl From<u64> for PackedNode {
	fn from(value: u64) -> Self {
		Self::Number(value.into())
	}
}

impl From<f64> for PackedNode {
	fn from(value: f64) -> Self {
		Number::from_f64(value).map(Self::Number).unwrap_or(Self::Null)
	}
}

impl From<&str> for PackedNode {
	fn from(value: &str) -> Self {
		Self::String(value.into())
	}
}

impl From<String> for PackedNode {
	fn from(value: String) -> Self {
		Self::String(value.into_boxed_str())
	}
}
