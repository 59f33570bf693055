//! The browser DOM as a [`Host`], and the window location for the routers.

use crate::{
	event::Event,
	host::{Host, HostError, Listener, NodeId, NodeKind},
	observer::Callback,
	router::Location,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use js_sys::Reflect;
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, Document, HtmlElement, Node};

/// Expando property that maps DOM nodes back to their [`NodeId`].
const ID_PROPERTY: &str = "__saplingNodeId";

fn platform(error: JsValue) -> HostError {
	HostError::Platform(format!("{:?}", error))
}

/// A [`Host`] over `web_sys`.
///
/// Nodes get an id the first time they are seen, either when created here or when reached
/// through [`WebHost::adopt`], a parent/child lookup or an event target.
pub struct WebHost {
	document: Document,
	nodes: RefCell<HashMap<NodeId, Node>>,
	next_id: Cell<u32>,
	//TODO: Drop listener closures along with the root they were installed on.
	closures: RefCell<Vec<Closure<dyn Fn(web_sys::Event)>>>,
}

impl WebHost {
	/// A host for the current window's document.
	pub fn new() -> Result<Self, HostError> {
		let document = window()
			.and_then(|window| window.document())
			.ok_or_else(|| HostError::Platform("no document".to_owned()))?;
		Ok(Self::for_document(document))
	}

	#[must_use]
	pub fn for_document(document: Document) -> Self {
		Self {
			document,
			nodes: RefCell::default(),
			next_id: Cell::new(0),
			closures: RefCell::default(),
		}
	}

	/// The id of `node`, assigning a fresh one if it has none yet.
	pub fn adopt(&self, node: &Node) -> NodeId {
		if let Some(id) = Reflect::get(node, &JsValue::from_str(ID_PROPERTY)).ok().and_then(|id| id.as_f64()) {
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let id = NodeId(id as u32);
			if self.nodes.borrow().contains_key(&id) {
				return id;
			}
		}

		let id = NodeId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		if let Err(error) = Reflect::set(node, &JsValue::from_str(ID_PROPERTY), &JsValue::from_f64(f64::from(id.0))) {
			warn!("Failed to tag node {:?}: {:?}", id, error);
		}
		self.nodes.borrow_mut().insert(id, node.clone());
		trace!(?id, "Adopted node.");
		id
	}

	/// Adopts `document.body`, the usual mount container.
	pub fn body(&self) -> Result<NodeId, HostError> {
		let body: HtmlElement = self.document.body().ok_or_else(|| HostError::Platform("no body".to_owned()))?;
		Ok(self.adopt(&body))
	}

	/// The DOM node behind `id`.
	pub fn node(&self, id: NodeId) -> Result<Node, HostError> {
		self.nodes.borrow().get(&id).cloned().ok_or(HostError::UnknownNode(id))
	}

	fn element(&self, id: NodeId) -> Result<web_sys::Element, HostError> {
		self.node(id)?.dyn_into::<web_sys::Element>().map_err(|_| HostError::NotAnElement(id))
	}

	fn forget(&self, node: &Node) {
		if let Some(id) = Reflect::get(node, &JsValue::from_str(ID_PROPERTY)).ok().and_then(|id| id.as_f64()) {
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let id = NodeId(id as u32);
			self.nodes.borrow_mut().remove(&id);
			if let Err(error) = Reflect::delete_property(node.unchecked_ref(), &JsValue::from_str(ID_PROPERTY)) {
				warn!("Failed to untag node: {:?}", error);
			}
		}
		let children = node.child_nodes();
		for index in 0..children.length() {
			if let Some(child) = children.get(index) {
				self.forget(&child);
			}
		}
	}
}

impl Host for WebHost {
	fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
		let element = self.document.create_element(tag).map_err(platform)?;
		Ok(self.adopt(&element))
	}

	fn create_text_node(&self, text: &str) -> Result<NodeId, HostError> {
		Ok(self.adopt(&self.document.create_text_node(text)))
	}

	fn create_fragment(&self) -> Result<NodeId, HostError> {
		Ok(self.adopt(&self.document.create_document_fragment()))
	}

	fn insert_before(&self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<(), HostError> {
		let reference = reference.map(|reference| self.node(reference)).transpose()?;
		self.node(parent)?
			.insert_before(&self.node(child)?, reference.as_ref())
			.map(drop)
			.map_err(|_| HostError::HierarchyRequest { parent, child })
	}

	fn replace_child(&self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> Result<(), HostError> {
		self.node(parent)?
			.replace_child(&self.node(new_child)?, &self.node(old_child)?)
			.map(drop)
			.map_err(|_| HostError::NotAChild { parent, child: old_child })
	}

	fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
		self.node(parent)?.remove_child(&self.node(child)?).map(drop).map_err(|_| HostError::NotAChild { parent, child })
	}

	fn parent_node(&self, node: NodeId) -> Result<Option<NodeId>, HostError> {
		Ok(self.node(node)?.parent_node().map(|parent| self.adopt(&parent)))
	}

	fn child_nodes(&self, node: NodeId) -> Result<Vec<NodeId>, HostError> {
		let children = self.node(node)?.child_nodes();
		Ok((0..children.length()).filter_map(|index| children.get(index)).map(|child| self.adopt(&child)).collect())
	}

	fn node_kind(&self, node: NodeId) -> Result<NodeKind, HostError> {
		let dom_node = self.node(node)?;
		Ok(match dom_node.node_type() {
			Node::ELEMENT_NODE => NodeKind::Element(dom_node.unchecked_into::<web_sys::Element>().tag_name().to_ascii_lowercase()),
			Node::TEXT_NODE => NodeKind::Text(dom_node.text_content().unwrap_or_default()),
			Node::DOCUMENT_FRAGMENT_NODE => NodeKind::Fragment,
			_ => NodeKind::Other,
		})
	}

	fn attributes(&self, element: NodeId) -> Result<Vec<(String, String)>, HostError> {
		let element = self.element(element)?;
		Ok(element
			.get_attribute_names()
			.iter()
			.filter_map(|name| name.as_string())
			.filter_map(|name| element.get_attribute(&name).map(|value| (name, value)))
			.collect())
	}

	fn set_attribute(&self, element: NodeId, name: &str, value: &str) -> Result<(), HostError> {
		self.element(element)?.set_attribute(name, value).map_err(platform)
	}

	fn remove_attribute(&self, element: NodeId, name: &str) -> Result<(), HostError> {
		self.element(element)?.remove_attribute(name).map_err(platform)
	}

	fn set_property(&self, element: NodeId, name: &str, value: bool) -> Result<(), HostError> {
		Reflect::set(&self.element(element)?, &JsValue::from_str(name), &JsValue::from_bool(value)).map(drop).map_err(platform)
	}

	fn set_text(&self, node: NodeId, text: &str) -> Result<(), HostError> {
		self.node(node)?.set_text_content(Some(text));
		Ok(())
	}

	fn listen(&self, target: NodeId, event_type: &str, listener: Listener) -> Result<(), HostError> {
		let node = self.node(target)?;
		let closure = Closure::wrap(Box::new(move |native: web_sys::Event| {
			let Some(target) = native.target().and_then(|target| target.dyn_into::<Node>().ok()) else {
				warn!("Event without a node target.");
				return;
			};
			let Some(id) = Reflect::get(&target, &JsValue::from_str(ID_PROPERTY)).ok().and_then(|id| id.as_f64()) else {
				trace!("Event target wasn't rendered by this host.");
				return;
			};
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let event = Event::new(native.type_(), NodeId(id as u32), native.bubbles()).with_native(native.clone());
			listener(&event);
			if event.is_propagation_stopped() {
				native.stop_propagation();
			}
			if event.is_default_prevented() {
				native.prevent_default();
			}
		}) as Box<dyn Fn(web_sys::Event)>);
		node.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref()).map_err(platform)?;
		self.closures.borrow_mut().push(closure);
		Ok(())
	}

	fn release(&self, node: NodeId) {
		match self.node(node) {
			Ok(node) => self.forget(&node),
			Err(error) => error!("Failed to release node: {}", error),
		}
	}
}

impl Debug for WebHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebHost").field("nodes", &self.nodes.borrow().len()).field("listeners", &self.closures.borrow().len()).finish_non_exhaustive()
	}
}

/// `window.location` and `window.history`.
#[derive(Default)]
pub struct BrowserLocation {
	closures: RefCell<Vec<Closure<dyn Fn()>>>,
}

impl BrowserLocation {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn listen(&self, event_type: &str, callback: Callback) {
		let Some(window) = window() else {
			error!("No window to listen to.");
			return;
		};
		let closure = Closure::wrap(Box::new(move || callback()) as Box<dyn Fn()>);
		match window.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref()) {
			Ok(()) => self.closures.borrow_mut().push(closure),
			Err(error) => error!("Failed to listen for {}: {:?}", event_type, error),
		}
	}
}

impl Location for BrowserLocation {
	fn pathname(&self) -> String {
		window().and_then(|window| window.location().pathname().ok()).unwrap_or_else(|| "/".to_owned())
	}

	fn hash(&self) -> String {
		window().and_then(|window| window.location().hash().ok()).unwrap_or_default()
	}

	fn push_state(&self, path: &str) {
		let pushed = window()
			.ok_or_else(|| JsValue::from_str("no window"))
			.and_then(|window| window.history())
			.and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(path)));
		if let Err(error) = pushed {
			error!("Failed to push history state: {:?}", error);
		}
	}

	fn set_hash(&self, hash: &str) {
		if let Some(window) = window() {
			if let Err(error) = window.location().set_hash(hash) {
				error!("Failed to set the hash: {:?}", error);
			}
		}
	}

	fn on_pop_state(&self, callback: Callback) {
		self.listen("popstate", callback);
	}

	fn on_hash_change(&self, callback: Callback) {
		self.listen("hashchange", callback);
	}
}

impl Debug for BrowserLocation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("BrowserLocation").field("pathname", &self.pathname()).field("hash", &self.hash()).finish()
	}
}
