use std::path::Path;

use crate::pack::{ConstructorRegistry, GraphBuilder, PackedFile, PackedNode, Result, UnpackOptions, Value, scan_for_ids};

/// Entry point turning packed trees into live object graphs.
///
/// Owns its constructor registry; two unpackers never see each other's
/// registrations. `unpack` takes `&self`, so one configured unpacker can be
/// shared across threads once registration is done.
#[derive(Debug, Default, Clone)]
pub struct Unpacker {
	registry: ConstructorRegistry,
	options: UnpackOptions,
}

impl Unpacker {
	/// Create an unpacker with no constructors and default limits.
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an unpacker with no constructors and the given limits.
	pub fn with_options(options: UnpackOptions) -> Self {
		Self {
			registry: ConstructorRegistry::new(),
			options,
		}
	}

	/// Register `factory` under `name`, replacing any earlier registration.
	pub fn register<F>(&mut self, name: impl Into<Box<str>>, factory: F)
	where
		F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
	{
		self.registry.register(name, factory);
	}

	/// Borrow the constructor registry.
	pub fn registry(&self) -> &ConstructorRegistry {
		&self.registry
	}

	/// Mutably borrow the constructor registry.
	pub fn registry_mut(&mut self) -> &mut ConstructorRegistry {
		&mut self.registry
	}

	/// Borrow the configured limits.
	pub fn options(&self) -> &UnpackOptions {
		&self.options
	}

	/// Scan `root` for identities, then materialize it.
	pub fn unpack(&self, root: &PackedNode) -> Result<Value> {
		let table = scan_for_ids(root, &self.options)?;
		let mut builder = GraphBuilder::new(&self.registry, &table, &self.options);
		let value = builder.build(root)?;
		tracing::debug!(identities = table.len(), materialized = builder.cached_len(), "unpacked graph");
		Ok(value)
	}

	/// Decode a wire-format JSON value and unpack it.
	pub fn unpack_json(&self, raw: &serde_json::Value) -> Result<Value> {
		self.unpack(&PackedNode::from_json(raw)?)
	}

	/// Parse wire-format JSON text and unpack it.
	pub fn unpack_str(&self, input: &str) -> Result<Value> {
		self.unpack(&input.parse::<PackedNode>()?)
	}

	/// Decode raw or zstd-compressed wire-format bytes and unpack them.
	pub fn unpack_slice(&self, bytes: &[u8]) -> Result<Value> {
		let file = PackedFile::from_bytes(bytes.to_vec())?;
		self.unpack(&file.root)
	}

	/// Read a packed document from disk and unpack it.
	pub fn unpack_file(&self, path: impl AsRef<Path>) -> Result<Value> {
		let file = PackedFile::open(path)?;
		self.unpack(&file.root)
	}
}

#[cfg(test)]
mod tests;
