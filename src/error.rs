use crate::host::{HostError, NodeId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
	/// Materialization requires a normalized tree.
	#[error("component `{0}` must be normalized before it can be materialized")]
	UnnormalizedComponent(&'static str),
	#[error("lazy views must be normalized before they can be materialized")]
	UnnormalizedLazy,
	#[error("depth limit reached")]
	DepthLimitReached,
	#[error("expected child {index} of {parent:?}, but the host tree is shorter")]
	OutOfSync { parent: NodeId, index: usize },
	#[error("render called while {0:?} was already being rendered")]
	Reentrant(NodeId),
	#[error("redirect loop while navigating to {0:?}")]
	RedirectLoop(String),
	#[error(transparent)]
	Host(#[from] HostError),
}
