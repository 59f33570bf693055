//! An in-memory document implementing [`Host`].
//!
//! Nodes live in an arena keyed by [`NodeId`]. The document mimics the parts of the DOM the
//! renderer relies on, including fragment insertion and bubbling dispatch to native listeners,
//! and can serialize subtrees to HTML for inspection.

use crate::{
	event::Event,
	host::{Host, HostError, Listener, NodeId, NodeKind},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter, Write as _},
};
use hashbrown::HashMap;
use tracing::{instrument, trace};

/// Elements that never have children and serialize without a closing tag.
const VOID_ELEMENTS: &[&str] = &["area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr"];

/// Identifies a listener added through [`Document::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug)]
enum Data {
	Element {
		tag: String,
		attributes: Vec<(String, String)>,
		properties: HashMap<String, bool>,
	},
	Text(String),
	Fragment,
}

#[derive(Debug)]
struct NodeData {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

struct RegisteredListener {
	id: ListenerId,
	event_type: String,
	listener: Listener,
}

#[derive(Default)]
struct Tree {
	nodes: HashMap<NodeId, NodeData>,
	next_node: u32,
	listeners: HashMap<NodeId, Vec<RegisteredListener>>,
	next_listener: u64,
}

impl Tree {
	fn node(&self, id: NodeId) -> Result<&NodeData, HostError> {
		self.nodes.get(&id).ok_or(HostError::UnknownNode(id))
	}

	fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, HostError> {
		self.nodes.get_mut(&id).ok_or(HostError::UnknownNode(id))
	}

	fn insert(&mut self, data: Data) -> NodeId {
		let id = NodeId(self.next_node);
		self.next_node += 1;
		self.nodes.insert(id, NodeData { data, parent: None, children: Vec::new() });
		id
	}

	fn element_data_mut(&mut self, id: NodeId) -> Result<(&mut Vec<(String, String)>, &mut HashMap<String, bool>), HostError> {
		match &mut self.node_mut(id)?.data {
			Data::Element { attributes, properties, .. } => Ok((attributes, properties)),
			_ => Err(HostError::NotAnElement(id)),
		}
	}

	fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
		if let Some(parent) = self.node_mut(child)?.parent.take() {
			self.node_mut(parent)?.children.retain(|&sibling| sibling != child);
		}
		Ok(())
	}

	fn is_inclusive_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> Result<bool, HostError> {
		loop {
			if node == ancestor {
				return Ok(true);
			}
			match self.node(node)?.parent {
				Some(parent) => node = parent,
				None => return Ok(false),
			}
		}
	}

	fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, HostError> {
		self.node(parent)?.children.iter().position(|&sibling| sibling == child).ok_or(HostError::NotAChild { parent, child })
	}
}

/// An in-memory DOM.
#[derive(Default)]
pub struct Document {
	tree: RefCell<Tree>,
}

impl Document {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of live nodes, attached or not.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.tree.borrow().nodes.len()
	}

	#[must_use]
	pub fn contains(&self, node: NodeId) -> bool {
		self.tree.borrow().nodes.contains_key(&node)
	}

	pub fn get_attribute(&self, element: NodeId, name: &str) -> Result<Option<String>, HostError> {
		match &self.tree.borrow().node(element)?.data {
			Data::Element { attributes, .. } => Ok(attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone())),
			_ => Err(HostError::NotAnElement(element)),
		}
	}

	/// Reads a boolean property. Unset properties reflect the presence of the same-named attribute.
	pub fn property(&self, element: NodeId, name: &str) -> Result<bool, HostError> {
		match &self.tree.borrow().node(element)?.data {
			Data::Element { attributes, properties, .. } => Ok(properties.get(name).copied().unwrap_or_else(|| attributes.iter().any(|(n, _)| n == name))),
			_ => Err(HostError::NotAnElement(element)),
		}
	}

	pub fn tag_name(&self, element: NodeId) -> Result<String, HostError> {
		match &self.tree.borrow().node(element)?.data {
			Data::Element { tag, .. } => Ok(tag.clone()),
			_ => Err(HostError::NotAnElement(element)),
		}
	}

	/// Concatenated text of all descendant text nodes.
	pub fn text_content(&self, node: NodeId) -> Result<String, HostError> {
		let tree = self.tree.borrow();
		let mut text = String::new();
		let mut pending = vec![node];
		while let Some(node) = pending.pop() {
			let data = tree.node(node)?;
			if let Data::Text(content) = &data.data {
				text.push_str(content);
			}
			pending.extend(data.children.iter().rev());
		}
		Ok(text)
	}

	/// Depth-first search for an element with the given `id` attribute below `root`, `root` included.
	pub fn get_element_by_id(&self, root: NodeId, id: &str) -> Result<Option<NodeId>, HostError> {
		Ok(self.find_elements(root, |_, attributes| attributes.iter().any(|(name, value)| name == "id" && value == id))?.into_iter().next())
	}

	/// All elements with the given tag below `root`, `root` included, in document order.
	pub fn elements_by_tag_name(&self, root: NodeId, tag: &str) -> Result<Vec<NodeId>, HostError> {
		self.find_elements(root, |element_tag, _| element_tag.eq_ignore_ascii_case(tag))
	}

	fn find_elements(&self, root: NodeId, predicate: impl Fn(&str, &[(String, String)]) -> bool) -> Result<Vec<NodeId>, HostError> {
		let tree = self.tree.borrow();
		let mut found = Vec::new();
		let mut pending = vec![root];
		while let Some(node) = pending.pop() {
			let data = tree.node(node)?;
			if let Data::Element { tag, attributes, .. } = &data.data {
				if predicate(tag, attributes) {
					found.push(node);
				}
			}
			pending.extend(data.children.iter().rev());
		}
		Ok(found)
	}

	/// Serializes `node` and its subtree.
	pub fn outer_html(&self, node: NodeId) -> Result<String, HostError> {
		let mut html = String::new();
		self.serialize(node, &mut html)?;
		Ok(html)
	}

	/// Serializes the children of `node`.
	pub fn inner_html(&self, node: NodeId) -> Result<String, HostError> {
		let mut html = String::new();
		for child in self.child_nodes(node)? {
			self.serialize(child, &mut html)?;
		}
		Ok(html)
	}

	fn serialize(&self, node: NodeId, html: &mut String) -> Result<(), HostError> {
		let (children, void) = {
			let tree = self.tree.borrow();
			let data = tree.node(node)?;
			match &data.data {
				Data::Text(text) => {
					escape_into(html, text, false);
					return Ok(());
				}
				Data::Fragment => (data.children.clone(), false),
				Data::Element { tag, attributes, .. } => {
					html.push('<');
					html.push_str(tag);
					for (name, value) in attributes {
						let _ = write!(html, " {name}=\"");
						escape_into(html, value, true);
						html.push('"');
					}
					html.push('>');
					(data.children.clone(), VOID_ELEMENTS.contains(&tag.as_str()))
				}
			}
		};
		if void {
			return Ok(());
		}
		for child in children {
			self.serialize(child, html)?;
		}
		if let Data::Element { tag, .. } = &self.tree.borrow().node(node)?.data {
			let _ = write!(html, "</{tag}>");
		}
		Ok(())
	}

	/// Adds a bubble-phase listener directly on `target`, like `addEventListener`.
	pub fn add_event_listener(&self, target: NodeId, event_type: &str, listener: Listener) -> Result<ListenerId, HostError> {
		let mut tree = self.tree.borrow_mut();
		tree.node(target)?;
		let id = ListenerId(tree.next_listener);
		tree.next_listener += 1;
		tree.listeners.entry(target).or_default().push(RegisteredListener {
			id,
			event_type: event_type.to_owned(),
			listener,
		});
		Ok(id)
	}

	/// Returns whether the listener was still registered.
	pub fn remove_event_listener(&self, listener: ListenerId) -> bool {
		let mut tree = self.tree.borrow_mut();
		for listeners in tree.listeners.values_mut() {
			if let Some(index) = listeners.iter().position(|registered| registered.id == listener) {
				listeners.remove(index);
				return true;
			}
		}
		false
	}

	/// Number of native listeners for `event_type` on `target`.
	#[must_use]
	pub fn listener_count(&self, target: NodeId, event_type: &str) -> usize {
		self.tree.borrow().listeners.get(&target).map_or(0, |listeners| listeners.iter().filter(|registered| registered.event_type == event_type).count())
	}

	/// Dispatches a bubbling event of `event_type` at `target`.
	pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> Result<Event, HostError> {
		self.dispatch(Event::new(event_type, target, true))
	}

	/// Shorthand for dispatching `click`.
	pub fn click(&self, target: NodeId) -> Result<Event, HostError> {
		self.dispatch_event(target, "click")
	}

	/// Dispatches `event` at its target, then at each ancestor if it bubbles.
	///
	/// The propagation path is fixed before any listener runs. Listeners on the node where
	/// propagation gets stopped still all run.
	#[instrument(skip(self))]
	pub fn dispatch(&self, event: Event) -> Result<Event, HostError> {
		let path = {
			let tree = self.tree.borrow();
			let mut path = vec![event.target()];
			if event.bubbles() {
				let mut node = tree.node(event.target())?;
				while let Some(parent) = node.parent {
					path.push(parent);
					node = tree.node(parent)?;
				}
			}
			path
		};

		for node in path {
			let listeners: Vec<Listener> = self
				.tree
				.borrow()
				.listeners
				.get(&node)
				.map(|listeners| listeners.iter().filter(|registered| registered.event_type == event.event_type()).map(|registered| registered.listener.clone()).collect())
				.unwrap_or_default();
			if listeners.is_empty() {
				continue;
			}
			event.set_current_target(node);
			for listener in listeners {
				listener(&event);
			}
			if event.is_propagation_stopped() {
				trace!(?node, "Propagation stopped.");
				break;
			}
		}
		Ok(event)
	}
}

impl Host for Document {
	fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
		Ok(self.tree.borrow_mut().insert(Data::Element {
			tag: tag.to_ascii_lowercase(),
			attributes: Vec::new(),
			properties: HashMap::new(),
		}))
	}

	fn create_text_node(&self, text: &str) -> Result<NodeId, HostError> {
		Ok(self.tree.borrow_mut().insert(Data::Text(text.to_owned())))
	}

	fn create_fragment(&self) -> Result<NodeId, HostError> {
		Ok(self.tree.borrow_mut().insert(Data::Fragment))
	}

	fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		if matches!(tree.node(parent)?.data, Data::Text(_)) {
			return Err(HostError::NotAnElement(parent));
		}
		if tree.is_inclusive_ancestor(child, parent)? {
			return Err(HostError::HierarchyRequest { parent, child });
		}
		if reference == Some(child) {
			return Ok(());
		}
		if let Some(reference) = reference {
			tree.position(parent, reference)?;
		}

		let moved = if matches!(tree.node(child)?.data, Data::Fragment) {
			core::mem::take(&mut tree.node_mut(child)?.children)
		} else {
			tree.detach(child)?;
			vec![child]
		};

		let mut index = match reference {
			Some(reference) => tree.position(parent, reference)?,
			None => tree.node(parent)?.children.len(),
		};
		for node in moved {
			tree.node_mut(node)?.parent = Some(parent);
			tree.node_mut(parent)?.children.insert(index, node);
			index += 1;
		}
		Ok(())
	}

	fn replace_child(&self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> Result<(), HostError> {
		if new_child == old_child {
			return Ok(());
		}
		let next_sibling = {
			let tree = self.tree.borrow();
			let index = tree.position(parent, old_child)?;
			tree.node(parent)?.children.get(index + 1).copied()
		};
		self.remove_child(parent, old_child)?;
		self.insert_before(parent, new_child, next_sibling.filter(|&next| next != new_child))
	}

	fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let index = tree.position(parent, child)?;
		tree.node_mut(parent)?.children.remove(index);
		tree.node_mut(child)?.parent = None;
		Ok(())
	}

	fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>, HostError> {
		Ok(self.tree.borrow().node(node)?.parent)
	}

	fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, HostError> {
		Ok(self.tree.borrow().node(node)?.children.clone())
	}

	fn node_kind(&self, node: NodeId) -> Result<NodeKind, HostError> {
		Ok(match &self.tree.borrow().node(node)?.data {
			Data::Element { tag, .. } => NodeKind::Element(tag.clone()),
			Data::Text(text) => NodeKind::Text(text.clone()),
			Data::Fragment => NodeKind::Fragment,
		})
	}

	fn attributes(&self, element: NodeId) -> Result<Vec<(String, String)>, HostError> {
		match &self.tree.borrow().node(element)?.data {
			Data::Element { attributes, .. } => Ok(attributes.clone()),
			_ => Err(HostError::NotAnElement(element)),
		}
	}

	fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let (attributes, _) = tree.element_data_mut(element)?;
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => value.clone_into(existing),
			None => attributes.push((name.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let (attributes, _) = tree.element_data_mut(element)?;
		attributes.retain(|(n, _)| n != name);
		Ok(())
	}

	fn set_property(&self, element: NodeId, name: &str, value: bool) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let (_, properties) = tree.element_data_mut(element)?;
		properties.insert(name.to_owned(), value);
		Ok(())
	}

	fn set_text(&self, node: NodeId, text: &str) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let data = tree.node_mut(node)?;
		if let Data::Text(content) = &mut data.data {
			text.clone_into(content);
			return Ok(());
		}
		// `textContent` semantics for elements and fragments: replace all children with one text node.
		let children = core::mem::take(&mut data.children);
		for child in children {
			tree.node_mut(child)?.parent = None;
		}
		if !text.is_empty() {
			let text_node = tree.insert(Data::Text(text.to_owned()));
			tree.node_mut(text_node)?.parent = Some(node);
			tree.node_mut(node)?.children.push(text_node);
		}
		Ok(())
	}

	fn listen(&self, target: NodeId, event_type: &str, listener: Listener) -> Result<(), HostError> {
		self.add_event_listener(target, event_type, listener).map(drop)
	}

	/// Frees `node` and its subtree, including native listeners on them.
	fn release(&self, node: NodeId) {
		let mut tree = self.tree.borrow_mut();
		if tree.detach(node).is_err() {
			return;
		}
		let mut pending = vec![node];
		while let Some(node) = pending.pop() {
			if let Some(data) = tree.nodes.remove(&node) {
				pending.extend(data.children);
			}
			tree.listeners.remove(&node);
		}
	}
}

impl Debug for Document {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let tree = self.tree.borrow();
		f.debug_struct("Document").field("nodes", &tree.nodes.len()).field("listening_nodes", &tree.listeners.len()).finish()
	}
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'"' if attribute => out.push_str("&quot;"),
			'<' if !attribute => out.push_str("&lt;"),
			'>' if !attribute => out.push_str("&gt;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			c => out.push(c),
		}
	}
}
