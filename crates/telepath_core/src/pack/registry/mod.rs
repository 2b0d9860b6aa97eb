use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::pack::{Record, Result, TelepathError, Value};

/// Constructor turning materialized arguments into a live value.
pub type Factory = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// Mapping from type name to constructor, owned by one unpacker.
#[derive(Default, Clone)]
pub struct ConstructorRegistry {
	constructors: HashMap<Box<str>, Factory>,
}

impl ConstructorRegistry {
	/// Create an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Store `factory` under `name`, replacing any earlier registration.
	pub fn register<F>(&mut self, name: impl Into<Box<str>>, factory: F)
	where
		F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
	{
		let name = name.into();
		if self.constructors.insert(name.clone(), Arc::new(factory)).is_some() {
			tracing::debug!(name = %name, "replaced existing constructor");
		}
	}

	/// Register a constructor producing a generic [`Record`] for `name`.
	pub fn register_record(&mut self, name: impl Into<Box<str>>) {
		let name = name.into();
		// Live values are `Rc`-based, so the shared name is re-wrapped per call.
		let type_name: Arc<str> = Arc::from(name.as_ref());
		self.register(name, move |args| {
			Ok(Record {
				type_name: Rc::from(type_name.as_ref()),
				args,
			}
			.into_value())
		});
	}

	/// Look up the constructor registered under `name`.
	pub fn lookup(&self, name: &str) -> Result<&Factory> {
		self.constructors
			.get(name)
			.ok_or_else(|| TelepathError::UnknownType { name: name.to_owned() })
	}

	/// Return whether `name` has a constructor.
	pub fn contains(&self, name: &str) -> bool {
		self.constructors.contains_key(name)
	}

	/// Return registered names in sorted order.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.constructors.keys().map(|name| name.as_ref()).collect();
		names.sort_unstable();
		names
	}

	/// Return number of registered constructors.
	pub fn len(&self) -> usize {
		self.constructors.len()
	}

	/// Return whether no constructor is registered.
	pub fn is_empty(&self) -> bool {
		self.constructors.is_empty()
	}
}

impl std::fmt::Debug for ConstructorRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConstructorRegistry").field("names", &self.names()).finish()
	}
}
