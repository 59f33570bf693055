use sapling_dom::{children, create_node, props, Child, NodeType, PropValue, Props};

mod memory_setup_;
use memory_setup_::init_tracing;

#[test]
fn div_with_text() {
	init_tracing();
	let node = create_node("div", Some(props! { "id" => "test" }), children!["Hello"]);

	assert_eq!(node.node_type, NodeType::Tag("div".to_owned()));
	assert_eq!(node.props, Some(props! { "id" => "test" }));
	assert_eq!(node.children, vec![Child::Text("Hello".to_owned())]);
}

#[test]
fn flattens_to_any_depth() {
	init_tracing();
	let nested = Child::from(vec![
		Child::from("a"),
		Child::from(vec![Child::from("b"), Child::from(vec![Child::from(vec![Child::from("c")])])]),
	]);
	let node = create_node("p", None, [nested, Child::from("d")]);

	assert_eq!(node.children, children!["a", "b", "c", "d"]);
}

#[test]
fn drops_nullish_and_booleans_but_keeps_zero() {
	init_tracing();
	let node = create_node("span", None, [Child::Null, Child::from(true), Child::from(false), Child::from(0), Child::from(None::<&str>), Child::from(-0.0)]);

	assert_eq!(node.children, vec![Child::Number(0.0), Child::Number(-0.0)]);
}

#[test]
fn drops_empty_strings_and_nan() {
	init_tracing();
	let node = create_node("span", None, children!["", f64::NAN, "x"]);

	assert_eq!(node.children, children!["x"]);
}

#[test]
fn props_keep_insertion_order() {
	init_tracing();
	let props: Props = [("b", PropValue::from(1)), ("a", PropValue::from("x")), ("c", PropValue::from(true))].into_iter().collect();

	assert_eq!(props.iter().map(|(name, _)| name).collect::<Vec<_>>(), ["b", "a", "c"]);
	assert_eq!(props.get("b"), Some(&PropValue::Number(1.0)));
	assert_eq!(props.text("a"), Some("x"));
}

#[test]
fn elements_nest() {
	init_tracing();
	let list = create_node("ul", None, [Child::from(create_node("li", None, children!["one"])), Child::from(create_node("li", None, children![2]))]);

	assert_eq!(list.tag(), Some("ul"));
	assert_eq!(list.children.len(), 2);
	match &list.children[1] {
		Child::Node(item) => assert_eq!(item.children, vec![Child::Number(2.0)]),
		other => panic!("Expected an element but found {:?}.", other),
	}
}
