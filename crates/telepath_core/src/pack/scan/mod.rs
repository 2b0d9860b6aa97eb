use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::pack::{Identity, PackedNode, Result, TelepathError, UnpackOptions};

/// Identity → raw node table built by one scan of a packed tree.
#[derive(Debug, Default)]
pub struct IdentityTable<'a> {
	nodes: HashMap<Identity, &'a PackedNode>,
	visited: usize,
}

impl<'a> IdentityTable<'a> {
	/// Return the node defining `id`.
	pub fn get(&self, id: Identity) -> Option<&'a PackedNode> {
		self.nodes.get(&id).copied()
	}

	/// Return whether `id` is defined.
	pub fn contains(&self, id: Identity) -> bool {
		self.nodes.contains_key(&id)
	}

	/// Return all definitions sorted by identity.
	pub fn entries(&self) -> Vec<(Identity, &'a PackedNode)> {
		let mut entries: Vec<_> = self.nodes.iter().map(|(id, node)| (*id, *node)).collect();
		entries.sort_by_key(|(id, _)| *id);
		entries
	}

	/// Return number of defined identities.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Return whether no identity is defined.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Return number of nodes the scan descended into.
	///
	/// A shared identified node reached through several parents counts once.
	pub fn visited(&self) -> usize {
		self.visited
	}
}

/// Record every identified node reachable from `root`.
///
/// References are leaves here; whether their targets exist is checked when building.
pub fn scan_for_ids<'a>(root: &'a PackedNode, options: &UnpackOptions) -> Result<IdentityTable<'a>> {
	let mut table = IdentityTable::default();
	scan_impl(root, &mut table, options, 0)?;
	tracing::debug!(identities = table.len(), visited = table.visited, "scanned packed tree");
	Ok(table)
}

fn scan_impl<'a>(node: &'a PackedNode, table: &mut IdentityTable<'a>, options: &UnpackOptions, depth: u32) -> Result<()> {
	if depth >= options.max_depth {
		return Err(TelepathError::DepthExceeded { max_depth: options.max_depth });
	}

	if let Some(id) = node.identity() {
		match table.nodes.entry(id) {
			Entry::Occupied(existing) => {
				if std::ptr::eq(*existing.get(), node) {
					return Ok(());
				}
				return Err(TelepathError::DuplicateIdentity { id });
			}
			Entry::Vacant(slot) => {
				slot.insert(node);
			}
		}
	}

	table.visited += 1;
	for child in node.children() {
		scan_impl(child.as_ref(), table, options, depth + 1)?;
	}

	Ok(())
}
