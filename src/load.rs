//! Reading existing host content back into normalized trees.

use crate::{
	host::{Host, HostError, NodeId, NodeKind},
	node::{PropValue, Props},
	normalize::{Element, Normalized},
};
use tracing::{trace, warn};

/// Loads the children of `parent`.
///
/// Nodes other than elements and text (comments, for example) are removed from the host, since
/// normalized trees can't represent them and would otherwise fall out of step with it.
pub fn load_child_nodes<H: Host + ?Sized>(host: &H, parent: NodeId) -> Result<Vec<Normalized>, HostError> {
	let mut loaded = Vec::new();
	for child in host.child_nodes(parent)? {
		match load_node(host, child)? {
			Some(node) => loaded.push(node),
			None => {
				warn!(?child, "Removing node that can't be adopted.");
				host.remove_child(parent, child)?;
			}
		}
	}
	Ok(loaded)
}

/// Loads `node` and its subtree, or returns [`None`] if it is neither an element nor text.
pub fn load_node<H: Host + ?Sized>(host: &H, node: NodeId) -> Result<Option<Normalized>, HostError> {
	Ok(match host.node_kind(node)? {
		NodeKind::Text(text) => Some(Normalized::Text(text)),
		NodeKind::Element(tag) => {
			trace!(tag = tag.as_str(), "Loading element.");
			Some(Normalized::Element(load_element(host, node, tag)?))
		}
		NodeKind::Fragment | NodeKind::Other => None,
	})
}

fn load_element<H: Host + ?Sized>(host: &H, element: NodeId, tag: String) -> Result<Element, HostError> {
	let attributes = host.attributes(element)?;
	let props = if attributes.is_empty() {
		None
	} else {
		Some(attributes.into_iter().map(|(name, value)| (name, PropValue::Text(value))).collect::<Props>())
	};
	Ok(Element {
		tag,
		props,
		children: load_child_nodes(host, element)?,
	})
}
