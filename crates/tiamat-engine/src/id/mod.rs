//! Recyclable id allocation.
//!
//! Every GPU resource handle in the engine is an [`Id`] issued by one of the
//! tables in this module. Ids are plain integers, stable across growth of the
//! backing storage and reused after removal. Uniqueness is per table: a
//! vertex-buffer id and a texture id with the same numeric value are
//! unrelated.

mod index_map;
mod ordered;
mod unordered;

pub use index_map::IndexMap;
pub use ordered::OrderedIdTable;
pub use unordered::UnorderedIdTable;

/// Recyclable integer handle. Not a pointer; meaningful only together with
/// the table (and therefore the resource kind) that issued it.
pub type Id = u32;

/// Error returned when an operation names an id that is not live in the
/// table it was given to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("id {0} is not live in this table")]
pub struct DeadId(pub Id);
