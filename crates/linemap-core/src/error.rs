//! Error types.

use crate::objects::ObjectId;
use thiserror::Error;

/// Outcome of a rejected or downgraded point adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    /// The requested source already depends on the owning object. The point
    /// was stored as a free coordinate instead.
    #[error("binding {owner} to {target} would create a constraint cycle")]
    Cycle { owner: ObjectId, target: ObjectId },
    /// The object refuses this kind of source. Nothing was changed.
    #[error("object {owner} cannot be attached to {target}")]
    InvalidSource { owner: ObjectId, target: ObjectId },
    /// The object only accepts bound points and the request was free.
    #[error("object {owner} must stay attached to a line")]
    Unattached { owner: ObjectId },
    /// No object with this id exists in the scene.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
}

/// Configuration parsing errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid registry: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Registry has no {0} entries")]
    Empty(&'static str),
}
