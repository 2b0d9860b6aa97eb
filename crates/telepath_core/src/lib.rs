//! Public library API for unpacking telepath-style packed object graphs.

/// Packed tree model, wire codec, identity scanning, and graph building.
pub mod pack;
