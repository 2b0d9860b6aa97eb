use thiserror::Error;

use crate::pack::Identity;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, TelepathError>;

/// Errors produced while loading, scanning, and materializing packed trees.
#[derive(Debug, Error)]
pub enum TelepathError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Input was not valid JSON.
	#[error("json: {0}")]
	Json(#[from] serde_json::Error),
	/// Decompression output exceeded configured safety limit.
	#[error("decompressed output exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// JSON value does not describe a well-formed packed node.
	#[error("malformed packed node at {path}: {reason}")]
	MalformedNode {
		/// Locator of the offending value, rooted at `$`.
		path: String,
		/// What was wrong with it.
		reason: &'static str,
	},
	/// Two distinct nodes in one tree carry the same identity.
	#[error("duplicate identity {id}")]
	DuplicateIdentity {
		/// Identity defined more than once.
		id: Identity,
	},
	/// A reference names an identity with no definition in the tree.
	#[error("dangling reference to identity {id}")]
	DanglingReference {
		/// Identity that could not be resolved.
		id: Identity,
	},
	/// A typed object names a type missing from the registry.
	#[error("unknown type: {name}")]
	UnknownType {
		/// Requested type name.
		name: String,
	},
	/// A typed object's arguments reference the object itself.
	#[error("typed object {id} references itself through its constructor arguments")]
	ConstructorCycle {
		/// Identity of the object under construction.
		id: Identity,
	},
	/// Scan or build recursion exceeded configured limit.
	#[error("unpack depth exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// A constructor rejected its arguments.
	#[error("constructor {type_name} failed: {message}")]
	FactoryFailed {
		/// Type name the constructor is registered under.
		type_name: String,
		/// Constructor-supplied description.
		message: String,
	},
	/// Arbitrary error raised from user constructor code.
	#[error(transparent)]
	Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
	/// Live value contains a cycle and cannot be rendered as plain JSON.
	#[error("value graph contains a cycle")]
	CyclicValue,
	/// Live value holds an object with no plain JSON rendering.
	#[error("object of type {type_name} has no plain JSON form")]
	UnsupportedObject {
		/// Type name of the opaque object.
		type_name: String,
	},
}

impl TelepathError {
	/// Build a [`TelepathError::FactoryFailed`] from constructor code.
	pub fn factory(type_name: impl Into<String>, message: impl Into<String>) -> Self {
		Self::FactoryFailed {
			type_name: type_name.into(),
			message: message.into(),
		}
	}
}
