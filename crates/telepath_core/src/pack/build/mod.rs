use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::pack::{ConstructorRegistry, Dict, Factory, Identity, IdentityTable, List, PackedNode, Result, TelepathError, UnpackOptions, Value};

/// Memoizing materializer for one packed tree.
///
/// Every identity resolves to exactly one live value per builder: containers
/// are cached before their contents are built so they can contain themselves,
/// typed objects are cached once their constructor returns.
///
/// A reference to a container that is still being filled is stored as a
/// non-owning back edge, so the finished graph is freed when its root is
/// dropped. The nesting height of every built value counts against
/// [`UnpackOptions::max_depth`], including height reached through cached
/// instances.
pub struct GraphBuilder<'a> {
	registry: &'a ConstructorRegistry,
	table: &'a IdentityTable<'a>,
	options: &'a UnpackOptions,
	cache: HashMap<Identity, Value>,
	heights: HashMap<Identity, u32>,
	filling: HashSet<Identity>,
	constructing: HashSet<Identity>,
}

/// One materialized value with the bookkeeping its parent needs.
struct Built {
	value: Value,
	height: u32,
	back_edge: bool,
}

impl Built {
	fn owned(value: Value, height: u32) -> Self {
		Self {
			value,
			height,
			back_edge: false,
		}
	}
}

impl<'a> GraphBuilder<'a> {
	/// Create a builder with an empty value cache.
	pub fn new(registry: &'a ConstructorRegistry, table: &'a IdentityTable<'a>, options: &'a UnpackOptions) -> Self {
		Self {
			registry,
			table,
			options,
			cache: HashMap::new(),
			heights: HashMap::new(),
			filling: HashSet::new(),
			constructing: HashSet::new(),
		}
	}

	/// Materialize `node` and everything reachable from it.
	pub fn build(&mut self, node: &'a PackedNode) -> Result<Value> {
		self.build_at(node, 0).map(|built| built.value)
	}

	/// Return the value materialized for `id` so far, if any.
	pub fn cached(&self, id: Identity) -> Option<&Value> {
		self.cache.get(&id)
	}

	/// Return number of identities materialized so far.
	pub fn cached_len(&self) -> usize {
		self.cache.len()
	}

	fn build_at(&mut self, node: &'a PackedNode, depth: u32) -> Result<Built> {
		if depth >= self.options.max_depth {
			return Err(self.too_deep());
		}

		if let Some(id) = node.identity() {
			if let Some(built) = self.lookup(id)? {
				return Ok(built);
			}
		}

		match node {
			PackedNode::Null => Ok(Built::owned(Value::Null, 0)),
			PackedNode::Bool(value) => Ok(Built::owned(Value::Bool(*value), 0)),
			PackedNode::Number(value) => Ok(Built::owned(Value::Number(value.clone()), 0)),
			PackedNode::String(value) => Ok(Built::owned(Value::String(value.as_ref().into()), 0)),
			PackedNode::Ref(id) => self.resolve(*id, depth),
			PackedNode::Verbatim { id, value } => {
				let height = json_height(value);
				self.check_height(height)?;
				let value = Value::from_json(value);
				self.remember(*id, &value, height);
				Ok(Built::owned(value, height))
			}
			PackedNode::List { id, items } => {
				let list = List::with_capacity(items.len());
				self.open(*id, Value::List(list.clone()));
				let filled = self.fill_list(&list, items, depth);
				let height = self.close(*id, filled)?;
				Ok(Built::owned(Value::List(list), height))
			}
			PackedNode::Dict { id, entries } => {
				let dict = Dict::new();
				self.open(*id, Value::Dict(dict.clone()));
				let filled = self.fill_dict(&dict, entries, depth);
				let height = self.close(*id, filled)?;
				Ok(Built::owned(Value::Dict(dict), height))
			}
			PackedNode::Object { id, type_name, args } => self.construct(*id, type_name, args, depth),
		}
	}

	fn lookup(&self, id: Identity) -> Result<Option<Built>> {
		if let Some(value) = self.cache.get(&id) {
			let built = if self.filling.contains(&id) {
				Built {
					value: value.clone(),
					height: 0,
					back_edge: true,
				}
			} else {
				Built::owned(value.clone(), self.heights.get(&id).copied().unwrap_or(0))
			};
			return Ok(Some(built));
		}
		if self.constructing.contains(&id) {
			return Err(TelepathError::ConstructorCycle { id });
		}
		Ok(None)
	}

	fn resolve(&mut self, id: Identity, depth: u32) -> Result<Built> {
		if let Some(built) = self.lookup(id)? {
			return Ok(built);
		}

		let target = self.table.get(id).ok_or(TelepathError::DanglingReference { id })?;
		self.build_at(target, depth + 1)
	}

	fn fill_list(&mut self, list: &List, items: &'a [Arc<PackedNode>], depth: u32) -> Result<u32> {
		let mut height = 0;
		for item in items {
			let child = self.build_at(item, depth + 1)?;
			height = height.max(child.height);
			if child.back_edge {
				list.push_back_edge(&child.value);
			} else {
				list.push(child.value);
			}
		}
		Ok(height + 1)
	}

	fn fill_dict(&mut self, dict: &Dict, entries: &'a BTreeMap<Box<str>, Arc<PackedNode>>, depth: u32) -> Result<u32> {
		let mut height = 0;
		for (key, item) in entries {
			let child = self.build_at(item, depth + 1)?;
			height = height.max(child.height);
			if child.back_edge {
				dict.insert_back_edge(key.as_ref(), &child.value);
			} else {
				dict.insert(key.as_ref(), child.value);
			}
		}
		Ok(height + 1)
	}

	fn open(&mut self, id: Option<Identity>, value: Value) {
		if let Some(id) = id {
			self.cache.insert(id, value);
			self.filling.insert(id);
		}
	}

	/// Finish a container opened with [`Self::open`], forgetting it again on failure.
	fn close(&mut self, id: Option<Identity>, filled: Result<u32>) -> Result<u32> {
		let checked = filled.and_then(|height| self.check_height(height).map(|()| height));
		if let Some(id) = id {
			self.filling.remove(&id);
			match checked {
				Ok(height) => {
					self.heights.insert(id, height);
				}
				Err(_) => {
					self.cache.remove(&id);
				}
			}
		}
		checked
	}

	fn construct(&mut self, id: Option<Identity>, type_name: &str, args: &'a [Arc<PackedNode>], depth: u32) -> Result<Built> {
		let factory = self.registry.lookup(type_name)?.clone();

		if let Some(id) = id {
			self.constructing.insert(id);
		}
		let invoked = self.invoke(&factory, type_name, args, depth);
		if let Some(id) = id {
			self.constructing.remove(&id);
		}

		let (value, height) = invoked?;
		self.check_height(height)?;
		self.remember(id, &value, height);
		Ok(Built::owned(value, height))
	}

	fn invoke(&mut self, factory: &Factory, type_name: &str, args: &'a [Arc<PackedNode>], depth: u32) -> Result<(Value, u32)> {
		let mut built = Vec::with_capacity(args.len());
		let mut height = 0;
		for arg in args {
			let child = self.build_at(arg, depth + 1)?;
			height = height.max(child.height);
			built.push(child.value);
		}

		tracing::trace!(type_name, args = built.len(), "invoking constructor");
		Ok((factory(built)?, height + 1))
	}

	fn remember(&mut self, id: Option<Identity>, value: &Value, height: u32) {
		if let Some(id) = id {
			self.cache.insert(id, value.clone());
			self.heights.insert(id, height);
		}
	}

	fn check_height(&self, height: u32) -> Result<()> {
		if height >= self.options.max_depth {
			return Err(self.too_deep());
		}
		Ok(())
	}

	fn too_deep(&self) -> TelepathError {
		TelepathError::DepthExceeded {
			max_depth: self.options.max_depth,
		}
	}
}

fn json_height(value: &serde_json::Value) -> u32 {
	match value {
		serde_json::Value::Array(items) => 1 + items.iter().map(json_height).max().unwrap_or(0),
		serde_json::Value::Object(map) => 1 + map.values().map(json_height).max().unwrap_or(0),
		_ => 0,
	}
}
