/// Runtime limits for scanning and building packed trees.
#[derive(Debug, Clone)]
pub struct UnpackOptions {
	/// Maximum nesting depth followed by the scanner and the builder.
	///
	/// Lazily resolved references count as one extra level each. The same
	/// ceiling bounds the nesting height of the built value, so a chain of
	/// references to already-built containers cannot nest past it either.
	pub max_depth: u32,
}

impl Default for UnpackOptions {
	fn default() -> Self {
		Self { max_depth: 512 }
	}
}

impl UnpackOptions {
	/// Preset for payloads from an untrusted producer.
	pub fn for_untrusted_input() -> Self {
		Self { max_depth: 64 }
	}
}
