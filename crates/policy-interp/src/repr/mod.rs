//! Fitted policy tree representation.

/// Node identifier: an index into the tree's SoA arrays (0 = root).
pub type NodeId = u32;

mod path;
mod tree;

pub use path::DecisionPath;
pub(crate) use tree::NodeRecord;
pub use tree::{PersistError, PolicyTree, QueryError, TreeValidationError};
