//! The node model: declarative descriptions of UI before normalization.

use crate::event::Handler;
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
};
use indexmap::IndexMap;
use std::rc::Rc;

/// A function component.
///
/// Components are invoked during normalization only, with their props plus a `children` entry.
#[derive(Clone)]
pub struct Component {
	name: &'static str,
	render: Rc<dyn Fn(Props) -> Child>,
}

impl Component {
	pub fn new(name: &'static str, render: impl 'static + Fn(Props) -> Child) -> Self {
		Self { name, render: Rc::new(render) }
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	#[must_use]
	pub fn render(&self, props: Props) -> Child {
		(self.render)(props)
	}
}

impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.render, &other.render)
	}
}

impl Debug for Component {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Component({})", self.name)
	}
}

/// A deferred view, resolved by calling it during normalization.
#[derive(Clone)]
pub struct Lazy(Rc<dyn Fn() -> Child>);

impl Lazy {
	pub fn new(view: impl 'static + Fn() -> Child) -> Self {
		Self(Rc::new(view))
	}

	#[must_use]
	pub fn resolve(&self) -> Child {
		(self.0)()
	}
}

impl PartialEq for Lazy {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Debug for Lazy {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Lazy({:p})", Rc::as_ptr(&self.0).cast::<()>())
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
	Tag(String),
	Component(Component),
}

impl From<&str> for NodeType {
	fn from(tag: &str) -> Self {
		Self::Tag(tag.to_owned())
	}
}

impl From<String> for NodeType {
	fn from(tag: String) -> Self {
		Self::Tag(tag)
	}
}

impl From<Component> for NodeType {
	fn from(component: Component) -> Self {
		Self::Component(component)
	}
}

impl From<&Component> for NodeType {
	fn from(component: &Component) -> Self {
		Self::Component(component.clone())
	}
}

/// A prop value.
///
/// `Data` carries arbitrary values into components and is never written to the host.
#[derive(Clone)]
pub enum PropValue {
	Null,
	Bool(bool),
	Number(f64),
	Text(String),
	Handler(Handler),
	Children(Vec<Child>),
	Data(Rc<dyn Any>),
}

impl PropValue {
	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_handler(&self) -> Option<&Handler> {
		match self {
			Self::Handler(handler) => Some(handler),
			_ => None,
		}
	}

	#[must_use]
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		match self {
			Self::Data(data) => data.downcast_ref(),
			_ => None,
		}
	}
}

impl PartialEq for PropValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			#[allow(clippy::float_cmp)]
			(Self::Number(a), Self::Number(b)) => a == b,
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Handler(a), Self::Handler(b)) => a == b,
			(Self::Children(a), Self::Children(b)) => a == b,
			(Self::Data(a), Self::Data(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl Debug for PropValue {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
			Self::Number(value) => f.debug_tuple("Number").field(value).finish(),
			Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
			Self::Handler(handler) => handler.fmt(f),
			Self::Children(children) => f.debug_tuple("Children").field(children).finish(),
			Self::Data(data) => write!(f, "Data({:p})", Rc::as_ptr(data).cast::<()>()),
		}
	}
}

impl From<&str> for PropValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

impl From<String> for PropValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<bool> for PropValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for PropValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

macro_rules! prop_value_from_integer {
	($($integer:ty),*) => {$(
		impl From<$integer> for PropValue {
			fn from(value: $integer) -> Self {
				Self::Number(f64::from(value))
			}
		}
	)*};
}
prop_value_from_integer!(i8, i16, i32, u8, u16, u32);

impl From<Handler> for PropValue {
	fn from(handler: Handler) -> Self {
		Self::Handler(handler)
	}
}

impl From<Vec<Child>> for PropValue {
	fn from(children: Vec<Child>) -> Self {
		Self::Children(children)
	}
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// Insertion-ordered props.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(IndexMap<String, PropValue>);

impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a prop. A replaced prop keeps its position.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) -> &mut Self {
		self.0.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
		self.insert(name, value);
		self
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue> {
		self.0.get(name)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn remove(&mut self, name: &str) -> Option<PropValue> {
		self.0.shift_remove(name)
	}

	/// Removes and returns the `children` prop a component was invoked with.
	pub fn take_children(&mut self) -> Vec<Child> {
		match self.remove("children") {
			Some(PropValue::Children(children)) => children,
			Some(PropValue::Null) | None => Vec::new(),
			Some(other) => vec![Child::from(other)],
		}
	}

	#[must_use]
	pub fn text(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(PropValue::as_text)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}
}

impl Extend<(String, PropValue)> for Props {
	fn extend<I: IntoIterator<Item = (String, PropValue)>>(&mut self, iter: I) {
		self.0.extend(iter);
	}
}

impl IntoIterator for Props {
	type Item = (String, PropValue);
	type IntoIter = indexmap::map::IntoIter<String, PropValue>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// A value in child position, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	/// `null` and `undefined` alike.
	Null,
	Bool(bool),
	Text(String),
	Number(f64),
	Node(VNode),
	List(Vec<Child>),
	Lazy(Lazy),
}

impl Child {
	/// Whether [`create_node`] keeps this value as a child.
	///
	/// Mirrors JavaScript truthiness, except that zero (`0` and `-0`) is kept and `true` is dropped.
	#[must_use]
	pub fn is_renderable(&self) -> bool {
		match self {
			Self::Null | Self::Bool(_) => false,
			Self::Text(text) => !text.is_empty(),
			Self::Number(number) => !number.is_nan(),
			Self::Node(_) | Self::List(_) | Self::Lazy(_) => true,
		}
	}
}

impl From<VNode> for Child {
	fn from(node: VNode) -> Self {
		Self::Node(node)
	}
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&String> for Child {
	fn from(text: &String) -> Self {
		Self::Text(text.clone())
	}
}

impl From<bool> for Child {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for Child {
	fn from(number: f64) -> Self {
		Self::Number(number)
	}
}

impl From<f32> for Child {
	fn from(number: f32) -> Self {
		Self::Number(f64::from(number))
	}
}

macro_rules! child_from_integer {
	($($integer:ty),*) => {$(
		impl From<$integer> for Child {
			fn from(number: $integer) -> Self {
				Self::Number(f64::from(number))
			}
		}
	)*};
}
child_from_integer!(i8, i16, i32, u8, u16, u32);

macro_rules! child_from_wide_integer {
	($($integer:ty),*) => {$(
		impl From<$integer> for Child {
			/// Precision beyond 2<sup>53</sup> is lost, as it would be in JavaScript.
			#[allow(clippy::cast_precision_loss)]
			fn from(number: $integer) -> Self {
				Self::Number(number as f64)
			}
		}
	)*};
}
child_from_wide_integer!(i64, u64, isize, usize);

impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Self::List(children.into_iter().map(Into::into).collect())
	}
}

impl From<Lazy> for Child {
	fn from(lazy: Lazy) -> Self {
		Self::Lazy(lazy)
	}
}

impl From<PropValue> for Child {
	fn from(value: PropValue) -> Self {
		match value {
			PropValue::Null | PropValue::Handler(_) | PropValue::Data(_) => Self::Null,
			PropValue::Bool(value) => Self::Bool(value),
			PropValue::Number(number) => Self::Number(number),
			PropValue::Text(text) => Self::Text(text),
			PropValue::Children(children) => Self::List(children),
		}
	}
}

/// A node description: tag or component, optional props and flattened children.
#[derive(Debug, Clone, PartialEq)]
pub struct VNode {
	pub node_type: NodeType,
	pub props: Option<Props>,
	pub children: Vec<Child>,
}

impl VNode {
	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match &self.node_type {
			NodeType::Tag(tag) => Some(tag),
			NodeType::Component(_) => None,
		}
	}

	#[must_use]
	pub fn prop(&self, name: &str) -> Option<&PropValue> {
		self.props.as_ref().and_then(|props| props.get(name))
	}
}

/// Creates a [`VNode`].
///
/// `children` is flattened to any depth. `null`-likes, booleans, empty strings and `NaN` are
/// dropped, while `0` is kept.
pub fn create_node(node_type: impl Into<NodeType>, props: Option<Props>, children: impl IntoIterator<Item = Child>) -> VNode {
	let mut flattened = Vec::new();
	for child in children {
		flatten_into(&mut flattened, child);
	}
	VNode { node_type: node_type.into(), props, children: flattened }
}

fn flatten_into(out: &mut Vec<Child>, child: Child) {
	match child {
		Child::List(children) => {
			for child in children {
				flatten_into(out, child);
			}
		}
		child if child.is_renderable() => out.push(child),
		_ => (),
	}
}

/// Builds [`Props`](crate::Props) from `name => value` pairs.
///
/// ```
/// let props = sapling_dom::props! { "id" => "test", "tabindex" => 1 };
/// assert_eq!(props.text("id"), Some("test"));
/// ```
#[macro_export]
macro_rules! props {
	() => {
		$crate::Props::new()
	};
	($($name:expr => $value:expr),+ $(,)?) => {{
		let mut props = $crate::Props::new();
		$(props.insert($name, $value);)+
		props
	}};
}

/// Builds a `Vec<Child>` from anything convertible into [`Child`](crate::Child).
#[macro_export]
macro_rules! children {
	($($child:expr),* $(,)?) => {
		::std::vec![$($crate::Child::from($child)),*]
	};
}
