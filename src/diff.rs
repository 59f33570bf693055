//! Reconciliation: diffing normalized trees and patching the host to match.

use crate::{
	error::Error,
	event::EventManager,
	host::{Host, NodeId},
	load,
	materialize::{materialize_normalized, remove_prop, set_prop},
	node::{Child, Props},
	normalize::{normalize, Element, Normalized},
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, error, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// Maximum node nesting below a container, counting text nodes as a level of their own.
	/// Deeper trees fail with [`Error::DepthLimitReached`].
	pub depth_limit: usize,
}

impl Default for Options {
	fn default() -> Self {
		Self { depth_limit: 512 }
	}
}

/// Renders node trees into host containers and keeps them up to date.
///
/// Each container has exactly one baseline: the normalized tree of its last render, which the
/// next render is diffed against and then replaces. Containers are owned by the renderer once
/// rendered into; their children must not be modified by other code.
pub struct Renderer<H: Host> {
	host: Rc<H>,
	events: EventManager,
	mounted: HashMap<NodeId, Normalized>,
	options: Options,
}

impl<H: 'static + Host> Renderer<H> {
	#[must_use]
	pub fn new(host: Rc<H>) -> Self {
		Self::with_options(host, Options::default())
	}

	#[must_use]
	pub fn with_options(host: Rc<H>, options: Options) -> Self {
		Self::with_event_manager(host, EventManager::new(), options)
	}

	/// Shares `events` with other renderers on the same host.
	#[must_use]
	pub fn with_event_manager(host: Rc<H>, events: EventManager, options: Options) -> Self {
		Self {
			host,
			events,
			mounted: HashMap::new(),
			options,
		}
	}

	#[must_use]
	pub fn host(&self) -> &Rc<H> {
		&self.host
	}

	#[must_use]
	pub fn events(&self) -> &EventManager {
		&self.events
	}

	#[must_use]
	pub fn options(&self) -> Options {
		self.options
	}

	/// The baseline the next render into `container` is diffed against.
	#[must_use]
	pub fn baseline(&self, container: NodeId) -> Option<&Normalized> {
		self.mounted.get(&container)
	}

	/// Normalizes `tree` and makes `container` reflect it.
	///
	/// The first render into a container appends freshly materialized nodes. Later renders only
	/// mutate what differs from the previous tree. Either way, delegation is (re)initialized on
	/// `container` afterwards, so handlers for newly used event types fire.
	///
	/// # Errors
	///
	/// On failure, the container is cleared and forgets its baseline, so that the next render
	/// starts over with a fresh mount.
	#[instrument(skip(self, tree))]
	pub fn render(&mut self, tree: impl Into<Child>, container: NodeId) -> Result<(), Error> {
		let next = normalize(tree);
		let result = match self.mounted.remove(&container) {
			None => self.mount(container, &next),
			Some(previous) => self.patch_children(container, previous.roots(), next.roots(), self.options.depth_limit),
		};
		if let Err(render_error) = result {
			error!("Render failed: {}. Clearing the container.", render_error);
			if let Err(clear_error) = self.clear(container) {
				error!("Failed to clear the container: {}", clear_error);
			}
			return Err(render_error);
		}
		self.mounted.insert(container, next);
		self.events.init_delegation(&self.host, container)?;
		debug!("Elements with delegated handlers: {}", self.events.len());
		Ok(())
	}

	/// Adopts the existing content of `container` as its baseline, so that the next render
	/// patches it instead of appending next to it.
	///
	/// Nodes the tree model can't express (like comments) are removed.
	#[instrument(skip(self))]
	pub fn hydrate(&mut self, container: NodeId) -> Result<(), Error> {
		let roots = load::load_child_nodes(&*self.host, container)?;
		trace!("Adopted {} root node(s).", roots.len());
		self.mounted.insert(container, Normalized::Fragment(roots));
		Ok(())
	}

	/// Removes everything rendered into `container` along with its handlers.
	#[instrument(skip(self))]
	pub fn unmount(&mut self, container: NodeId) -> Result<(), Error> {
		if self.mounted.remove(&container).is_none() {
			warn!("Unmounting a container that wasn't rendered into.");
		}
		self.clear(container)
	}

	fn clear(&mut self, container: NodeId) -> Result<(), Error> {
		self.mounted.remove(&container);
		for node in self.host.child_nodes(container)? {
			self.remove(container, node)?;
		}
		Ok(())
	}

	fn mount(&mut self, container: NodeId, next: &Normalized) -> Result<(), Error> {
		for root in next.roots() {
			let node = materialize_normalized(&*self.host, &self.events, root, self.options.depth_limit)?;
			self.host.append_child(container, node)?;
		}
		Ok(())
	}

	fn remove(&mut self, parent: NodeId, node: NodeId) -> Result<(), Error> {
		self.host.remove_child(parent, node)?;
		self.discard(node)
	}

	fn discard(&mut self, node: NodeId) -> Result<(), Error> {
		self.events.forget_subtree(&*self.host, node)?;
		self.host.release(node);
		Ok(())
	}

	/// Brings the host children of `parent` from `vdom_a` to `vdom_b`.
	#[instrument(skip(self, vdom_a, vdom_b))]
	fn patch_children(&mut self, parent: NodeId, vdom_a: &[Normalized], vdom_b: &[Normalized], depth_limit: usize) -> Result<(), Error> {
		// Leaf elements have no child level to count, same as when they were created.
		if vdom_a.is_empty() && vdom_b.is_empty() {
			return Ok(());
		}
		if depth_limit == 0 {
			return Err(Error::DepthLimitReached);
		}

		let dom_slice = self.host.child_nodes(parent)?;
		if STATIC_MAX_LEVEL >= Level::WARN && dom_slice.len() != vdom_a.len() {
			warn!("Expected {} child node(s) but found {}.", vdom_a.len(), dom_slice.len());
		}

		if let (Some(keys_a), Some(keys_b)) = (unique_keys(vdom_a), unique_keys(vdom_b)) {
			return self.patch_keyed(parent, &dom_slice, vdom_a, &keys_a, vdom_b, &keys_b, depth_limit);
		}

		let common = vdom_a.len().min(vdom_b.len());
		for (index, (a, b)) in vdom_a.iter().zip(vdom_b).enumerate() {
			let node = *dom_slice.get(index).ok_or(Error::OutOfSync { parent, index })?;
			self.patch(parent, node, a, b, depth_limit)?;
		}

		for index in common..vdom_a.len() {
			let span = trace_span!("Removing excess node", index);
			let _enter = span.enter();
			let node = *dom_slice.get(index).ok_or(Error::OutOfSync { parent, index })?;
			self.remove(parent, node)?;
		}

		for b in &vdom_b[common..] {
			let span = trace_span!("Appending node");
			let _enter = span.enter();
			let node = materialize_normalized(&*self.host, &self.events, b, depth_limit)?;
			self.host.append_child(parent, node)?;
		}
		Ok(())
	}

	/// Children matched by `key`: kept ones are patched and moved into place, the rest created or removed.
	#[allow(clippy::too_many_arguments)]
	fn patch_keyed(&mut self, parent: NodeId, dom_slice: &[NodeId], vdom_a: &[Normalized], keys_a: &[String], vdom_b: &[Normalized], keys_b: &[String], depth_limit: usize) -> Result<(), Error> {
		let span = trace_span!("Diffing keyed", "vdom_a.len()" = vdom_a.len(), "vdom_b.len()" = vdom_b.len());
		let _enter = span.enter();

		let mut slots: HashMap<&str, usize> = keys_a.iter().enumerate().map(|(index, key)| (key.as_str(), index)).collect();
		let mut kept = vec![false; vdom_a.len()];
		let mut placed = Vec::with_capacity(vdom_b.len());

		for (b, key_b) in vdom_b.iter().zip(keys_b) {
			let reusable = slots.remove(key_b.as_str()).filter(|&index| same_tag(&vdom_a[index], b));
			let node = match reusable {
				Some(index) => {
					let node = *dom_slice.get(index).ok_or(Error::OutOfSync { parent, index })?;
					kept[index] = true;
					self.patch(parent, node, &vdom_a[index], b, depth_limit)?
				}
				None => {
					trace!(key = key_b.as_str(), "Creating keyed node.");
					materialize_normalized(&*self.host, &self.events, b, depth_limit)?
				}
			};
			placed.push(node);
		}

		for (index, _) in kept.iter().enumerate().filter(|(_, kept)| !**kept) {
			let node = *dom_slice.get(index).ok_or(Error::OutOfSync { parent, index })?;
			trace!(key = keys_a[index].as_str(), "Removing keyed node.");
			self.remove(parent, node)?;
		}

		// Move or insert each node into its final position, mirroring the host's child list.
		let mut current = self.host.child_nodes(parent)?;
		for (index, &node) in placed.iter().enumerate() {
			let occupant = current.get(index).copied();
			if occupant == Some(node) {
				continue;
			}
			self.host.insert_before(parent, node, occupant)?;
			if let Some(from) = current.iter().position(|&n| n == node) {
				current.remove(from);
			}
			current.insert(index, node);
		}
		Ok(())
	}

	/// Patches one node, returning the host node now at its position.
	fn patch(&mut self, parent: NodeId, node: NodeId, a: &Normalized, b: &Normalized, depth_limit: usize) -> Result<NodeId, Error> {
		match (a, b) {
			(Normalized::Text(t_1), Normalized::Text(t_2)) => {
				if t_1 == t_2 {
					trace!("Text unchanged.");
				} else {
					if cfg!(feature = "dangerous-logging") {
						trace!(t_1 = t_1.as_str(), t_2 = t_2.as_str(), "Updating text.");
					}
					self.host.set_text(node, t_2)?;
				}
				Ok(node)
			}

			(Normalized::Element(e_1), Normalized::Element(e_2)) if e_1.tag == e_2.tag => {
				let span = trace_span!("Diffing element", tag = e_1.tag.as_str(), ?node);
				let _enter = span.enter();
				self.patch_props(node, e_1.props.as_ref(), e_2.props.as_ref())?;
				self.patch_children(node, &e_1.children, &e_2.children, depth_limit - 1)?;
				Ok(node)
			}

			// Mismatching nodes: Destroy and rebuild.
			(n_1, n_2) => {
				let span = trace_span!("Replace mismatching", ?node);
				let _enter = span.enter();
				if STATIC_MAX_LEVEL >= Level::WARN {
					if let (Normalized::Element(e_1), Normalized::Element(e_2)) = (n_1, n_2) {
						if e_1.tag.eq_ignore_ascii_case(&e_2.tag) {
							warn!("Recreating element due to different tag name casing: {:?} -> {:?}", e_1.tag, e_2.tag);
						}
					}
				}
				let replacement = materialize_normalized(&*self.host, &self.events, n_2, depth_limit)?;
				self.host.replace_child(parent, replacement, node)?;
				self.discard(node)?;
				Ok(replacement)
			}
		}
	}

	/// Removals go first, so that aliases like `className`/`class` can't undo an addition.
	fn patch_props(&mut self, element: NodeId, props_a: Option<&Props>, props_b: Option<&Props>) -> Result<(), Error> {
		if let Some(props_a) = props_a {
			for (name, previous) in props_a.iter() {
				if !props_b.map_or(false, |props_b| props_b.contains(name)) {
					trace!(prop = name, "Removing prop.");
					remove_prop(&*self.host, &self.events, element, name, previous)?;
				}
			}
		}
		if let Some(props_b) = props_b {
			for (name, value) in props_b.iter() {
				let previous = props_a.and_then(|props_a| props_a.get(name));
				if previous == Some(value) {
					continue;
				}
				trace!(prop = name, "Setting prop.");
				set_prop(&*self.host, &self.events, element, name, value, previous)?;
			}
		}
		Ok(())
	}
}

fn same_tag(a: &Normalized, b: &Normalized) -> bool {
	matches!((a, b), (Normalized::Element(a), Normalized::Element(b)) if a.tag == b.tag)
}

/// The keys of `nodes` if every one of them is an element with a distinct `key`.
fn unique_keys(nodes: &[Normalized]) -> Option<Vec<String>> {
	if nodes.is_empty() {
		return None;
	}
	let keys = nodes.iter().map(|node| node.as_element().and_then(Element::key)).collect::<Option<Vec<_>>>()?;
	let distinct = keys.iter().collect::<HashSet<_>>().len();
	if distinct == keys.len() {
		Some(keys)
	} else {
		warn!("Duplicate keys among siblings. Falling back to positional diffing.");
		None
	}
}

impl<H: Host> Debug for Renderer<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Renderer")
			.field("events", &self.events)
			.field("mounted", &self.mounted.keys().collect::<Vec<_>>())
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}
