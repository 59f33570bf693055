//! Turning node descriptions into host nodes.

use crate::{
	error::Error,
	event::EventManager,
	host::{Host, NodeId},
	node::{Child, NodeType, PropValue, Props, VNode},
	normalize::{number_to_string, Normalized},
};
use tracing::{instrument, trace, trace_span, warn};

/// How a prop name is written to the host.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PropTarget<'a> {
	Attribute(&'a str),
	/// `onClick` → `click`.
	Event(String),
	/// Reconciliation-only props.
	Ignored,
}

pub(crate) fn classify(name: &str) -> PropTarget<'_> {
	match name {
		"className" => PropTarget::Attribute("class"),
		"key" | "children" => PropTarget::Ignored,
		_ => match name.strip_prefix("on") {
			Some(event) if event.starts_with(|c: char| c.is_ascii_uppercase()) => PropTarget::Event(event.to_ascii_lowercase()),
			_ => PropTarget::Attribute(name),
		},
	}
}

/// Writes one prop to `element`. `previous` is the value the host currently reflects, if any.
pub(crate) fn set_prop<H: Host + ?Sized>(host: &H, events: &EventManager, element: NodeId, name: &str, value: &PropValue, previous: Option<&PropValue>) -> Result<(), Error> {
	match classify(name) {
		PropTarget::Ignored => (),
		PropTarget::Event(event_type) => match value {
			PropValue::Handler(handler) => events.attach_handler(element, &event_type, handler.clone()),
			other => {
				if let Some(PropValue::Handler(previous)) = previous {
					events.detach_handler(element, &event_type, previous);
				}
				if !matches!(other, PropValue::Null) {
					warn!(prop = name, "Ignoring non-handler value of event prop.");
				}
			}
		},
		PropTarget::Attribute(attribute) => match value {
			PropValue::Handler(_) => warn!(prop = name, "Ignoring handler on a prop that doesn't name an event."),
			PropValue::Text(text) => host.set_attribute(element, attribute, text)?,
			PropValue::Number(number) => host.set_attribute(element, attribute, &number_to_string(*number))?,
			PropValue::Bool(true) => {
				host.set_attribute(element, attribute, "")?;
				host.set_property(element, attribute, true)?;
			}
			PropValue::Bool(false) => {
				host.remove_attribute(element, attribute)?;
				host.set_property(element, attribute, false)?;
			}
			PropValue::Null => remove_prop(host, events, element, name, previous.unwrap_or(&PropValue::Null))?,
			PropValue::Children(_) | PropValue::Data(_) => trace!(prop = name, "Not reflected to the host."),
		},
	}
	Ok(())
}

/// Undoes a prop that is absent from the next render.
pub(crate) fn remove_prop<H: Host + ?Sized>(host: &H, events: &EventManager, element: NodeId, name: &str, previous: &PropValue) -> Result<(), Error> {
	match classify(name) {
		PropTarget::Ignored => (),
		PropTarget::Event(event_type) => {
			if let PropValue::Handler(previous) = previous {
				events.detach_handler(element, &event_type, previous);
			}
		}
		PropTarget::Attribute(attribute) => match previous {
			PropValue::Handler(_) | PropValue::Children(_) | PropValue::Data(_) => (),
			PropValue::Bool(_) => {
				host.remove_attribute(element, attribute)?;
				host.set_property(element, attribute, false)?;
			}
			PropValue::Null | PropValue::Text(_) | PropValue::Number(_) => host.remove_attribute(element, attribute)?,
		},
	}
	Ok(())
}

fn create_tag<H: Host + ?Sized>(host: &H, events: &EventManager, tag: &str, props: Option<&Props>) -> Result<NodeId, Error> {
	let element = host.create_element(tag)?;
	for (name, value) in props.into_iter().flat_map(Props::iter) {
		set_prop(host, events, element, name, value, None)?;
	}
	Ok(element)
}

/// Creates host nodes for `node`, registering its handlers with `events`.
///
/// - `null`-likes and booleans become empty text nodes, strings and numbers text nodes.
/// - A list becomes a fragment holding each item in order.
/// - A tag node becomes an element with its props applied and children appended.
///
/// # Errors
///
/// [`Error::UnnormalizedComponent`] or [`Error::UnnormalizedLazy`] if `node` (or anything below it)
/// still needs normalization, and host failures.
#[instrument(skip(host, events, node))]
pub fn materialize<H: Host + ?Sized>(host: &H, events: &EventManager, node: &Child) -> Result<NodeId, Error> {
	Ok(match node {
		Child::Null | Child::Bool(_) => host.create_text_node("")?,
		Child::Text(text) => host.create_text_node(text)?,
		Child::Number(number) => host.create_text_node(&number_to_string(*number))?,
		Child::Lazy(_) => return Err(Error::UnnormalizedLazy),
		Child::List(items) => {
			let fragment = host.create_fragment()?;
			for item in items {
				let item = materialize(host, events, item)?;
				host.append_child(fragment, item)?;
			}
			fragment
		}
		Child::Node(VNode { node_type: NodeType::Component(component), .. }) => return Err(Error::UnnormalizedComponent(component.name())),
		Child::Node(VNode { node_type: NodeType::Tag(tag), props, children }) => {
			let span = trace_span!("Creating element", tag = tag.as_str());
			let _enter = span.enter();
			let element = create_tag(host, events, tag, props.as_ref())?;
			for child in children {
				let child = materialize(host, events, child)?;
				host.append_child(element, child)?;
			}
			element
		}
	})
}

/// Creates host nodes for a normalized tree, failing past `depth_limit` levels of elements.
pub(crate) fn materialize_normalized<H: Host + ?Sized>(host: &H, events: &EventManager, node: &Normalized, depth_limit: usize) -> Result<NodeId, Error> {
	if depth_limit == 0 {
		return Err(Error::DepthLimitReached);
	}
	Ok(match node {
		Normalized::Text(text) => {
			if cfg!(feature = "dangerous-logging") {
				trace!(text = text.as_str(), "Creating text node.");
			}
			host.create_text_node(text)?
		}
		Normalized::Fragment(roots) => {
			let fragment = host.create_fragment()?;
			for root in roots {
				let root = materialize_normalized(host, events, root, depth_limit)?;
				host.append_child(fragment, root)?;
			}
			fragment
		}
		Normalized::Element(element) => {
			let span = trace_span!("Creating element", tag = element.tag.as_str());
			let _enter = span.enter();
			let dom_element = create_tag(host, events, &element.tag, element.props.as_ref())?;
			for child in &element.children {
				let child = materialize_normalized(host, events, child, depth_limit - 1)?;
				host.append_child(dom_element, child)?;
			}
			dom_element
		}
	})
}
