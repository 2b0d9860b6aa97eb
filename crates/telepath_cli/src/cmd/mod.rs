/// Identity table listing command.
pub mod ids;
/// Indented tree rendering for live values.
pub mod print;
/// Type name listing command.
pub mod types;
/// Full unpack command.
pub mod unpack;
/// Shared helpers for command output.
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
