//! Delegated event handling.
//!
//! Elements never get native listeners of their own. Instead, [`EventManager`] records the
//! active [`Handler`] per `(element, event type)` and installs a single native listener per event
//! type on each render root, which walks from the event target up to that root and invokes
//! whatever is registered along the way. Re-renders therefore only touch the registry.

use crate::host::{Host, HostError, Listener, NodeId};
use core::{
	any::Any,
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::{HashMap, HashSet};
use std::{
	panic::{self, AssertUnwindSafe},
	rc::Rc,
};
use tracing::{error, instrument, trace, trace_span, warn};

/// An event travelling through the tree.
///
/// The same instance is seen by native listeners and delegated handlers, so stopping
/// propagation in either stops it for both.
pub struct Event {
	event_type: String,
	target: NodeId,
	current_target: Cell<NodeId>,
	bubbles: bool,
	propagation_stopped: Cell<bool>,
	default_prevented: Cell<bool>,
	native: Option<Box<dyn Any>>,
}

impl Event {
	#[must_use]
	pub fn new(event_type: impl Into<String>, target: NodeId, bubbles: bool) -> Self {
		Self {
			event_type: event_type.into(),
			target,
			current_target: Cell::new(target),
			bubbles,
			propagation_stopped: Cell::new(false),
			default_prevented: Cell::new(false),
			native: None,
		}
	}

	/// Attaches the platform's own event object, retrievable through [`Event::native`].
	#[must_use]
	pub fn with_native(mut self, native: impl Any) -> Self {
		self.native = Some(Box::new(native));
		self
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// The node the event was originally dispatched to.
	#[must_use]
	pub fn target(&self) -> NodeId {
		self.target
	}

	/// The node whose handler is currently running.
	#[must_use]
	pub fn current_target(&self) -> NodeId {
		self.current_target.get()
	}

	pub fn set_current_target(&self, node: NodeId) {
		self.current_target.set(node);
	}

	#[must_use]
	pub fn bubbles(&self) -> bool {
		self.bubbles
	}

	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	#[must_use]
	pub fn is_propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}

	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	#[must_use]
	pub fn is_default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	#[must_use]
	pub fn native<T: Any>(&self) -> Option<&T> {
		self.native.as_ref().and_then(|native| native.downcast_ref())
	}
}

impl Debug for Event {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("event_type", &self.event_type)
			.field("target", &self.target)
			.field("current_target", &self.current_target.get())
			.field("bubbles", &self.bubbles)
			.field("propagation_stopped", &self.propagation_stopped.get())
			.field("default_prevented", &self.default_prevented.get())
			.finish_non_exhaustive()
	}
}

/// A user-supplied event callback.
///
/// Identity is the allocation: clones of one `Handler` are equal, two handlers made from
/// identical closures are not.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
	pub fn new(handler: impl 'static + Fn(&Event)) -> Self {
		Self(Rc::new(handler))
	}

	/// Runs the handler, catching a panic so that the caller can finish its dispatch pass first.
	///
	/// The panic is logged and its payload returned. Hand it to [`panic::resume_unwind`] once done.
	/// Where panics abort (as on `wasm32-unknown-unknown` by default), nothing is caught.
	pub fn call(&self, event: &Event) -> std::thread::Result<()> {
		panic::catch_unwind(AssertUnwindSafe(|| (self.0)(event))).map_err(|panic| {
			let message = panic
				.downcast_ref::<&str>()
				.copied()
				.or_else(|| panic.downcast_ref::<String>().map(String::as_str))
				.unwrap_or("<non-string panic payload>");
			error!(event_type = event.event_type(), current_target = ?event.current_target(), "Event handler panicked: {}", message);
			panic
		})
	}
}

impl<F: 'static + Fn(&Event)> From<F> for Handler {
	fn from(handler: F) -> Self {
		Self::new(handler)
	}
}

impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for Handler {}

impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

#[derive(Default)]
struct Registry {
	handlers: HashMap<NodeId, HashMap<String, Handler>>,
	/// Every event type a handler was ever attached for.
	known_types: Vec<String>,
	/// Event types with a native listener, per delegation root.
	delegated: HashMap<NodeId, HashSet<String>>,
}

/// Shared handle to a delegated handler registry.
///
/// Clones refer to the same registry. The registry is only borrowed for the duration of a
/// lookup or mutation, never while a handler runs, so handlers may re-render freely.
#[derive(Clone, Default)]
pub struct EventManager {
	registry: Rc<RefCell<Registry>>,
}

impl EventManager {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes `handler` the active handler for `(element, event_type)`, replacing any previous one.
	///
	/// This does not install a native listener; see [`EventManager::init_delegation`].
	#[instrument(skip(self))]
	pub fn attach_handler(&self, element: NodeId, event_type: &str, handler: Handler) {
		let mut registry = self.registry.borrow_mut();
		if !registry.known_types.iter().any(|known| known == event_type) {
			trace!("First handler for this event type.");
			registry.known_types.push(event_type.to_owned());
		}
		registry.handlers.entry(element).or_default().insert(event_type.to_owned(), handler);
	}

	/// Removes the handler for `(element, event_type)`, but only if it is `handler` itself.
	///
	/// A handler installed by a later render is left alone.
	#[instrument(skip(self))]
	pub fn detach_handler(&self, element: NodeId, event_type: &str, handler: &Handler) {
		let mut registry = self.registry.borrow_mut();
		let Some(by_type) = registry.handlers.get_mut(&element) else {
			return trace!("No handlers registered for this element.");
		};
		match by_type.get(event_type) {
			Some(current) if current == handler => {
				by_type.remove(event_type);
				if by_type.is_empty() {
					registry.handlers.remove(&element);
				}
			}
			Some(_) => trace!("A different handler is active. Leaving it in place."),
			None => trace!("No handler registered for this event type."),
		}
	}

	/// Drops every registration in the host subtree rooted at `node`, `node` included.
	pub fn forget_subtree<H: Host + ?Sized>(&self, host: &H, node: NodeId) -> Result<(), HostError> {
		let mut pending = vec![node];
		let mut forgotten = 0_usize;
		while let Some(node) = pending.pop() {
			if self.registry.borrow_mut().handlers.remove(&node).is_some() {
				forgotten += 1;
			}
			pending.extend(host.child_nodes(node)?);
		}
		trace!(?node, forgotten, "Forgot handlers of removed subtree.");
		Ok(())
	}

	#[must_use]
	pub fn handler(&self, element: NodeId, event_type: &str) -> Option<Handler> {
		self.registry.borrow().handlers.get(&element).and_then(|by_type| by_type.get(event_type)).cloned()
	}

	/// Number of elements with at least one active handler.
	#[must_use]
	pub fn len(&self) -> usize {
		self.registry.borrow().handlers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Installs one native listener on `root` for each event type that has been attached so far
	/// and isn't delegated from `root` yet.
	///
	/// Calling this again only adds listeners for event types seen since the last call.
	#[instrument(skip(self, host))]
	pub fn init_delegation<H: 'static + Host>(&self, host: &Rc<H>, root: NodeId) -> Result<(), HostError> {
		let missing: Vec<String> = {
			let registry = self.registry.borrow();
			let delegated = registry.delegated.get(&root);
			registry.known_types.iter().filter(|event_type| delegated.map_or(true, |delegated| !delegated.contains(*event_type))).cloned().collect()
		};

		for event_type in missing {
			let span = trace_span!("Delegating", event_type = event_type.as_str());
			let _enter = span.enter();

			let weak_host = Rc::downgrade(host);
			let manager = self.clone();
			let listener: Listener = Rc::new(move |event: &Event| match weak_host.upgrade() {
				Some(host) => manager.dispatch(&*host, root, event),
				None => warn!("Host dropped while its delegation listener is still installed."),
			});
			host.listen(root, &event_type, listener)?;
			self.registry.borrow_mut().delegated.entry(root).or_default().insert(event_type);
		}
		Ok(())
	}

	/// Runs the delegated handlers for `event` from its target up to `root`, inclusive.
	///
	/// Elements without a handler for the event type are skipped. The walk ends early once a
	/// handler stops propagation. Afterwards, the current target is `root` again, as it would
	/// be for the native listener that called this.
	///
	/// # Panics
	///
	/// Once the walk is done, the first panic raised by a handler is resumed.
	#[instrument(skip(self, host))]
	pub fn dispatch<H: Host + ?Sized>(&self, host: &H, root: NodeId, event: &Event) {
		let mut path = vec![event.target()];
		if event.bubbles() {
			let mut node = event.target();
			while node != root {
				match host.parent_node(node) {
					Ok(Some(parent)) => {
						path.push(parent);
						node = parent;
					}
					Ok(None) => {
						warn!(target = ?event.target(), ?root, "Event target is outside of the delegation root.");
						break;
					}
					Err(error) => {
						error!("Failed to walk ancestors: {}", error);
						break;
					}
				}
			}
		}

		let mut panicked = None;
		for node in path {
			let Some(handler) = self.handler(node, event.event_type()) else {
				continue;
			};
			let span = trace_span!("Delegated handler", ?node);
			let _enter = span.enter();
			event.set_current_target(node);
			if let Err(panic) = handler.call(event) {
				panicked.get_or_insert(panic);
			}
			if event.is_propagation_stopped() {
				trace!("Propagation stopped.");
				break;
			}
		}
		event.set_current_target(root);
		if let Some(panic) = panicked {
			panic::resume_unwind(panic);
		}
	}
}

impl Debug for EventManager {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let registry = self.registry.borrow();
		f.debug_struct("EventManager")
			.field("elements", &registry.handlers.len())
			.field("known_types", &registry.known_types)
			.field("roots", &registry.delegated.len())
			.finish()
	}
}
