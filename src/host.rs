//! The host binding layer.
//!
//! Everything above this module (materialization, reconciliation, delegation) only talks to a
//! platform through [`Host`], so the same algorithms drive the in-memory [`Document`](crate::memory::Document)
//! and, on `wasm32`, the browser DOM.

use crate::event::Event;
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use thiserror::Error;

/// Opaque identity of a platform node, handed out by the [`Host`] that created or adopted it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
	#[must_use]
	pub fn get(self) -> u32 {
		self.0
	}
}

impl Debug for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// What a platform node is, as far as the reconciler cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
	/// Lowercase tag name.
	Element(String),
	Text(String),
	Fragment,
	/// Comments, processing instructions and the like.
	Other,
}

/// A native bubble-phase listener installed through [`Host::listen`].
pub type Listener = Rc<dyn Fn(&Event)>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
	#[error("unknown node {0:?}")]
	UnknownNode(NodeId),
	#[error("{child:?} is not a child of {parent:?}")]
	NotAChild { parent: NodeId, child: NodeId },
	#[error("{0:?} is not an element")]
	NotAnElement(NodeId),
	#[error("inserting {child:?} into {parent:?} would create a cycle")]
	HierarchyRequest { parent: NodeId, child: NodeId },
	#[error("platform error: {0}")]
	Platform(String),
}

/// Node tree operations the renderer needs from a platform.
///
/// Methods take `&self`: hosts are shared behind [`Rc`] between the renderer and the native
/// listeners they install, so implementations use interior mutability and must not hold a
/// borrow while calling a [`Listener`].
pub trait Host {
	fn create_element(&self, tag: &str) -> Result<NodeId, HostError>;
	fn create_text_node(&self, text: &str) -> Result<NodeId, HostError>;
	fn create_fragment(&self) -> Result<NodeId, HostError>;

	/// Inserts `child` before `reference`, or at the end if `reference` is [`None`].
	///
	/// Inserting a fragment moves the fragment's children instead, leaving it empty.
	fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), HostError>;

	fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
		self.insert_before(parent, child, None)
	}

	fn replace_child(&self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> Result<(), HostError>;
	fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

	fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>, HostError>;
	fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, HostError>;
	fn node_kind(&self, node: NodeId) -> Result<NodeKind, HostError>;

	/// Attributes in document order.
	fn attributes(&self, element: NodeId) -> Result<Vec<(String, String)>, HostError>;
	fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), HostError>;
	fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), HostError>;

	/// Sets a boolean IDL property like `disabled` or `checked`.
	fn set_property(&self, element: NodeId, name: &str, value: bool) -> Result<(), HostError>;

	fn set_text(&self, node: NodeId, text: &str) -> Result<(), HostError>;

	/// Adds a bubble-phase listener for `event_type` on `target`.
	fn listen(&self, target: NodeId, event_type: &str, listener: Listener) -> Result<(), HostError>;

	/// Signals that a detached subtree won't be referenced by the renderer anymore.
	fn release(&self, _node: NodeId) {}
}
