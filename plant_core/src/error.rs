//! Error types for the plant core.

use crate::entity::Entity;
use thiserror::Error;

/// Errors raised by the component store.
///
/// Lookup misses are not errors: `get`/`get_mut` return `None` because a
/// component is legitimately optional on any entity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The handle refers to a destroyed (or never created) entity
    #[error("Entity {0} is not alive")]
    DeadEntity(Entity),
}
