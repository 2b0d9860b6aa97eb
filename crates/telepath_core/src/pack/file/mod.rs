use std::fs;
use std::path::Path;

use crate::pack::compression::decode_bytes;
use crate::pack::{Compression, IdentityTable, PackedNode, Result, UnpackOptions, scan_for_ids};

/// Packed document loaded from disk or memory.
#[derive(Debug)]
pub struct PackedFile {
	/// Compression mode detected for source bytes.
	pub compression: Compression,
	/// Decoded root node.
	pub root: PackedNode,
}

impl PackedFile {
	/// Read, decompress, and decode a packed document from disk.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let raw = fs::read(path)?;
		Self::from_bytes(raw)
	}

	/// Decompress and decode a packed document held in memory.
	pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
		let (compression, bytes) = decode_bytes(raw)?;
		let json: serde_json::Value = serde_json::from_slice(&bytes)?;
		let root = PackedNode::from_json(&json)?;
		Ok(Self { compression, root })
	}

	/// Scan the document for identities without materializing anything.
	pub fn scan(&self, options: &UnpackOptions) -> Result<IdentityTable<'_>> {
		scan_for_ids(&self.root, options)
	}
}
