use sapling_dom::{children, create_node, props, Child, Error, Handler, Host, NodeKind, Options, PropValue, Renderer, VNode};
use std::rc::Rc;

mod memory_setup_;
use memory_setup_::{renderer, setup, Counter};

fn list(items: &[&str]) -> VNode {
	create_node("ul", None, items.iter().map(|item| Child::from(create_node("li", None, children![*item]))).collect::<Vec<_>>())
}

#[test]
fn first_render_mounts() {
	let (mut renderer, document, body) = renderer();

	renderer.render(list(&["a", "b"]), body).unwrap();

	assert_eq!(document.inner_html(body).unwrap(), "<ul><li>a</li><li>b</li></ul>");
	assert!(renderer.baseline(body).is_some());
}

#[test]
fn changing_one_leaf_keeps_its_siblings() {
	let (mut renderer, document, body) = renderer();
	renderer.render(list(&["a", "b", "c"]), body).unwrap();
	let ul = document.child_nodes(body).unwrap()[0];
	let before = document.child_nodes(ul).unwrap();
	let texts_before: Vec<_> = before.iter().map(|&li| document.child_nodes(li).unwrap()[0]).collect();
	let node_count = document.node_count();

	renderer.render(list(&["a", "B", "c"]), body).unwrap();

	assert_eq!(document.child_nodes(body).unwrap(), vec![ul]);
	assert_eq!(document.child_nodes(ul).unwrap(), before);
	let texts_after: Vec<_> = before.iter().map(|&li| document.child_nodes(li).unwrap()[0]).collect();
	assert_eq!(texts_after, texts_before);
	assert_eq!(document.node_kind(texts_after[1]).unwrap(), NodeKind::Text("B".to_owned()));
	assert_eq!(document.node_count(), node_count);
}

#[test]
fn identical_render_changes_nothing() {
	let (mut renderer, document, body) = renderer();
	let tree = || create_node("p", Some(props! { "class" => "x", "title" => 3 }), children!["same"]);
	renderer.render(tree(), body).unwrap();
	let p = document.child_nodes(body).unwrap()[0];
	let html = document.inner_html(body).unwrap();

	renderer.render(tree(), body).unwrap();

	assert_eq!(document.child_nodes(body).unwrap(), vec![p]);
	assert_eq!(document.inner_html(body).unwrap(), html);
}

#[test]
fn excess_children_are_removed_and_new_ones_appended() {
	let (mut renderer, document, body) = renderer();
	renderer.render(list(&["a", "b", "c"]), body).unwrap();
	let ul = document.child_nodes(body).unwrap()[0];
	let first = document.child_nodes(ul).unwrap()[0];
	let removed = document.child_nodes(ul).unwrap()[2];

	renderer.render(list(&["a", "b"]), body).unwrap();
	assert_eq!(document.inner_html(body).unwrap(), "<ul><li>a</li><li>b</li></ul>");
	assert!(!document.contains(removed));

	renderer.render(list(&["a", "b", "c", "d"]), body).unwrap();
	assert_eq!(document.inner_html(body).unwrap(), "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>");
	assert_eq!(document.child_nodes(ul).unwrap()[0], first);
}

#[test]
fn kind_or_tag_changes_replace() {
	let (mut renderer, document, body) = renderer();
	renderer.render(create_node("div", None, [Child::from(create_node("b", None, children!["x"])), Child::from("text")]), body).unwrap();
	let div = document.child_nodes(body).unwrap()[0];
	let b = document.child_nodes(div).unwrap()[0];

	renderer.render(create_node("div", None, [Child::from(create_node("i", None, children!["x"])), Child::from(create_node("span", None, children![]))]), body).unwrap();

	assert_eq!(document.inner_html(body).unwrap(), "<div><i>x</i><span></span></div>");
	assert_eq!(document.child_nodes(body).unwrap(), vec![div]);
	assert!(!document.contains(b));
}

#[test]
fn props_are_added_updated_and_removed() {
	let (mut renderer, document, body) = renderer();
	renderer.render(create_node("input", Some(props! { "className" => "a", "value" => "1", "disabled" => true }), children![]), body).unwrap();
	let input = document.child_nodes(body).unwrap()[0];
	assert!(document.property(input, "disabled").unwrap());

	renderer.render(create_node("input", Some(props! { "className" => "b", "placeholder" => "type here" }), children![]), body).unwrap();

	assert_eq!(document.child_nodes(body).unwrap(), vec![input]);
	assert_eq!(document.outer_html(input).unwrap(), r#"<input class="b" placeholder="type here">"#);
	assert!(!document.property(input, "disabled").unwrap());
}

#[test]
fn button_removed_and_added() {
	let (mut renderer, document, body) = renderer();
	let old_clicks = Counter::new();
	let new_clicks = Counter::new();
	let button = |id: &str, counter: &Counter| {
		let counter = counter.clone();
		Child::from(create_node("button", Some(props! { "id" => id, "onClick" => Handler::new(move |_| counter.bump()) }), children![id]))
	};

	renderer.render(create_node("div", None, [button("old", &old_clicks)]), body).unwrap();
	let old = document.get_element_by_id(body, "old").unwrap().unwrap();

	renderer.render(create_node("div", None, [Child::from(create_node("span", None, children!["no button"])), button("new", &new_clicks)]), body).unwrap();
	let new = document.get_element_by_id(body, "new").unwrap().unwrap();

	assert!(!document.contains(old));
	assert_eq!(renderer.events().handler(old, "click"), None);
	document.click(new).unwrap();
	assert_eq!((old_clicks.get(), new_clicks.get()), (0, 1));
}

#[test]
fn keyed_children_move_instead_of_being_rebuilt() {
	let (mut renderer, document, body) = renderer();
	let keyed = |keys: &[&str]| {
		create_node(
			"ul",
			None,
			keys.iter().map(|key| Child::from(create_node("li", Some(props! { "key" => *key }), children![*key]))).collect::<Vec<_>>(),
		)
	};

	renderer.render(keyed(&["a", "b", "c", "d"]), body).unwrap();
	let ul = document.child_nodes(body).unwrap()[0];
	let items = document.child_nodes(ul).unwrap();
	let (a, b, c, d) = (items[0], items[1], items[2], items[3]);

	renderer.render(keyed(&["d", "a", "c", "e"]), body).unwrap();

	let after = document.child_nodes(ul).unwrap();
	assert_eq!(&after[..3], &[d, a, c]);
	assert!(!document.contains(b));
	assert_eq!(document.inner_html(ul).unwrap(), "<li>d</li><li>a</li><li>c</li><li>e</li>");
}

#[test]
fn hydrate_adopts_existing_content() {
	let (document, body) = setup();
	let p = document.create_element("p").unwrap();
	let text = document.create_text_node("server").unwrap();
	document.append_child(p, text).unwrap();
	document.set_attribute(p, "id", "greeting").unwrap();
	document.append_child(body, p).unwrap();

	let mut renderer = Renderer::new(Rc::clone(&document));
	renderer.hydrate(body).unwrap();
	assert_eq!(
		renderer.baseline(body).and_then(|baseline| baseline.roots()[0].as_element()).and_then(|element| element.prop("id")),
		Some(&PropValue::from("greeting"))
	);

	renderer.render(create_node("p", Some(props! { "id" => "greeting" }), children!["client"]), body).unwrap();

	assert_eq!(document.child_nodes(body).unwrap(), vec![p]);
	assert_eq!(document.child_nodes(p).unwrap(), vec![text]);
	assert_eq!(document.inner_html(body).unwrap(), r#"<p id="greeting">client</p>"#);
}

#[test]
fn unmount_clears_nodes_and_handlers() {
	let (mut renderer, document, body) = renderer();
	renderer.render(create_node("button", Some(props! { "onClick" => Handler::new(|_| ()) }), children!["x"]), body).unwrap();
	assert_eq!(renderer.events().len(), 1);

	renderer.unmount(body).unwrap();

	assert!(document.child_nodes(body).unwrap().is_empty());
	assert!(renderer.events().is_empty());
	assert!(renderer.baseline(body).is_none());
	assert_eq!(document.node_count(), 1);
}

#[test]
fn too_deep_trees_fail_and_clear_the_container() {
	let (document, body) = setup();
	let mut renderer = Renderer::with_options(Rc::clone(&document), Options { depth_limit: 4 });

	let deep = create_node("a", None, [Child::from(create_node("b", None, [Child::from(create_node("c", None, children!["x"]))]))]);
	renderer.render(deep, body).unwrap();

	let deeper = create_node("a", None, [Child::from(create_node("b", None, [Child::from(create_node("c", None, [Child::from(create_node("d", None, children!["y"]))]))]))]);
	assert_eq!(renderer.render(deeper, body), Err(Error::DepthLimitReached));
	assert!(document.child_nodes(body).unwrap().is_empty());
	assert!(renderer.baseline(body).is_none());

	renderer.render(create_node("p", None, children!["recovered"]), body).unwrap();
	assert_eq!(document.inner_html(body).unwrap(), "<p>recovered</p>");
}

#[test]
fn trees_at_the_depth_limit_re_render_in_place() {
	let (document, body) = setup();
	let mut renderer = Renderer::with_options(Rc::clone(&document), Options { depth_limit: 2 });

	renderer.render(create_node("div", None, [Child::from(create_node("span", None, children![]))]), body).unwrap();
	let div = document.child_nodes(body).unwrap()[0];
	let span = document.child_nodes(div).unwrap()[0];

	renderer.render(create_node("div", None, [Child::from(create_node("span", Some(props! { "id" => "leaf" }), children![]))]), body).unwrap();
	assert_eq!(document.inner_html(body).unwrap(), r#"<div><span id="leaf"></span></div>"#);
	assert_eq!(document.child_nodes(body).unwrap(), vec![div]);
	assert_eq!(document.child_nodes(div).unwrap(), vec![span]);
}

#[test]
fn deep_nesting_re_renders_in_place() {
	fn tower(levels: usize, leaf: &str) -> Child {
		(0..levels).fold(Child::from(leaf), |inner, _| create_node("div", None, [inner]).into())
	}

	let (mut renderer, document, body) = renderer();
	renderer.render(tower(50, "before"), body).unwrap();

	let mut path = vec![body];
	while let Some(&child) = document.child_nodes(*path.last().unwrap()).unwrap().first() {
		path.push(child);
	}
	// 50 elements and the text node.
	assert_eq!(path.len(), 52);

	renderer.render(tower(50, "after"), body).unwrap();

	let mut node = body;
	for &expected in &path[1..] {
		node = document.child_nodes(node).unwrap()[0];
		assert_eq!(node, expected);
	}
	assert_eq!(document.text_content(body).unwrap(), "after");
}

#[test]
fn separate_containers_keep_separate_baselines() {
	let (mut renderer, document, body) = renderer();
	let aside = document.create_element("aside").unwrap();

	renderer.render("main", body).unwrap();
	renderer.render(children!["side", 1], aside).unwrap();
	renderer.render("main!", body).unwrap();

	assert_eq!(document.inner_html(body).unwrap(), "main!");
	assert_eq!(document.inner_html(aside).unwrap(), "side1");
}
