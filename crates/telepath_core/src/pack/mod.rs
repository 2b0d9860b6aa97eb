mod build;
mod compression;
mod error;
mod file;
mod node;
mod options;
mod registry;
mod scan;
mod unpack;
mod value;
mod wire;

/// Memoizing graph materializer.
pub use build::GraphBuilder;
/// Compression detection result.
pub use compression::{Compression, ZSTD_MAGIC};
/// Error and result aliases.
pub use error::{Result, TelepathError};
/// Packed document loader.
pub use file::PackedFile;
/// Packed tree representation.
pub use node::{Identity, PackedNode};
/// Scan and build limits.
pub use options::UnpackOptions;
/// Constructor registry types.
pub use registry::{ConstructorRegistry, Factory};
/// Identity scanning pass.
pub use scan::{IdentityTable, scan_for_ids};
/// Unpacking entry point.
pub use unpack::Unpacker;
/// Live runtime value types.
pub use value::{Dict, List, Object, Record, Value};
/// Wire format helpers.
pub use wire::{RESERVED_KEYS, is_reserved};
