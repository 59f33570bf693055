//! Normalization resolves components and primitive children into a pure tag/text tree.

use crate::node::{Child, NodeType, Props, PropValue, VNode};
use tracing::trace;

/// A normalized element: no components anywhere below it, and every child is non-empty text or an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub tag: String,
	pub props: Option<Props>,
	pub children: Vec<Normalized>,
}

impl Element {
	#[must_use]
	pub fn prop(&self, name: &str) -> Option<&PropValue> {
		self.props.as_ref().and_then(|props| props.get(name))
	}

	/// The reconciliation key, if a `key` prop is present.
	#[must_use]
	pub fn key(&self) -> Option<String> {
		match self.prop("key")? {
			PropValue::Text(key) => Some(key.clone()),
			PropValue::Number(key) => Some(number_to_string(*key)),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
	Text(String),
	Element(Element),
	/// Several sibling roots. Only produced at the top level; inside elements, fragments are spliced into their parent.
	Fragment(Vec<Normalized>),
}

impl Normalized {
	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(element) => Some(element),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// The nodes this tree contributes to its container, in order.
	#[must_use]
	pub fn roots(&self) -> &[Normalized] {
		match self {
			Self::Fragment(roots) => roots,
			single => core::slice::from_ref(single),
		}
	}
}

impl From<Normalized> for Child {
	fn from(normalized: Normalized) -> Self {
		match normalized {
			Normalized::Text(text) => Child::Text(text),
			Normalized::Element(Element { tag, props, children }) => Child::Node(VNode {
				node_type: NodeType::Tag(tag),
				props,
				children: children.into_iter().map(Child::from).collect(),
			}),
			Normalized::Fragment(roots) => Child::List(roots.into_iter().map(Child::from).collect()),
		}
	}
}

/// Normalizes a node description.
///
/// - `null`-likes and booleans become `""`.
/// - Numbers and strings become their string form (`-0` as `"0"`).
/// - Lazy views are called and their result normalized.
/// - Components are called with their props plus `children`, and replaced by their normalized output.
/// - Elements keep their props and get normalized children, with empty text left out.
pub fn normalize(node: impl Into<Child>) -> Normalized {
	normalize_child(node.into())
}

fn normalize_child(child: Child) -> Normalized {
	match child {
		Child::Null | Child::Bool(_) => Normalized::Text(String::new()),
		Child::Number(number) => Normalized::Text(number_to_string(number)),
		Child::Text(text) => Normalized::Text(text),
		Child::Lazy(lazy) => normalize_child(lazy.resolve()),
		Child::List(children) => Normalized::Fragment(normalize_children(children)),
		Child::Node(VNode { node_type: NodeType::Component(component), props, children }) => {
			trace!(component = component.name(), "Invoking component.");
			let mut props = props.unwrap_or_default();
			props.insert("children", PropValue::Children(children));
			normalize_child(component.render(props))
		}
		Child::Node(VNode { node_type: NodeType::Tag(tag), props, children }) => Normalized::Element(Element {
			tag,
			props,
			children: normalize_children(children),
		}),
	}
}

fn normalize_children(children: Vec<Child>) -> Vec<Normalized> {
	let mut normalized = Vec::with_capacity(children.len());
	for child in children {
		push_normalized(&mut normalized, normalize_child(child));
	}
	normalized
}

fn push_normalized(out: &mut Vec<Normalized>, normalized: Normalized) {
	match normalized {
		Normalized::Text(text) if text.is_empty() => (),
		Normalized::Fragment(nodes) => {
			for node in nodes {
				push_normalized(out, node);
			}
		}
		other => out.push(other),
	}
}

/// Formats a number the way JavaScript's `String(number)` does.
///
/// Magnitudes from 1e21 up and below 1e-6 use exponent notation (`1e+21`, `1.5e-7`).
#[must_use]
pub fn number_to_string(number: f64) -> String {
	if number == 0.0 {
		// Also catches `-0`.
		"0".to_owned()
	} else if number.is_nan() {
		"NaN".to_owned()
	} else if number.is_infinite() {
		if number > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
	} else if number.abs() >= 1e21 || number.abs() < 1e-6 {
		let formatted = format!("{number:e}");
		match formatted.split_once('e') {
			Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
			_ => formatted,
		}
	} else {
		// Shortest round-trip digits, never in exponent form.
		number.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::number_to_string;

	#[test]
	fn numbers_format_like_javascript() {
		assert_eq!(number_to_string(0.0), "0");
		assert_eq!(number_to_string(-0.0), "0");
		assert_eq!(number_to_string(-42.0), "-42");
		assert_eq!(number_to_string(10000.0), "10000");
		assert_eq!(number_to_string(1.5), "1.5");
		assert_eq!(number_to_string(f64::NAN), "NaN");
		assert_eq!(number_to_string(1e21), "1e+21");
		assert_eq!(number_to_string(-2.5e30), "-2.5e+30");
		assert_eq!(number_to_string(999_999_999_999_999_900_000.0), "999999999999999900000");
		assert_eq!(number_to_string(1e-7), "1e-7");
		assert_eq!(number_to_string(1.5e-7), "1.5e-7");
		assert_eq!(number_to_string(0.000_001), "0.000001");
		assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
	}
}
