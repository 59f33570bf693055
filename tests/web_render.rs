#![cfg(target_arch = "wasm32")]

use sapling_dom::{children, create_node, props, web::WebHost, Child, Handler, Host, Renderer};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

fn init_log() {
	unsafe {
		if !LOG_INITIALIZED {
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}
}

fn container(host: &WebHost) -> sapling_dom::NodeId {
	let body = host.body().unwrap();
	let div = host.create_element("div").unwrap();
	host.append_child(body, div).unwrap();
	div
}

#[wasm_bindgen_test]
fn click() {
	init_log();
	let host = Rc::new(WebHost::new().unwrap());
	let root = container(&host);
	let mut renderer = Renderer::new(Rc::clone(&host));

	let clicks = Rc::new(Cell::new(0));
	let on_click = Handler::new({
		let clicks = Rc::clone(&clicks);
		move |event| {
			assert!(event.native::<web_sys::Event>().is_some());
			clicks.set(clicks.get() + 1);
		}
	});

	renderer
		.render(create_node("div", None, [Child::from(create_node("button", Some(props! { "id" => "test-button", "onClick" => on_click }), children!["Press"]))]), root)
		.unwrap();
	assert_eq!(clicks.get(), 0);

	let button: HtmlElement = window().unwrap().document().unwrap().get_element_by_id("test-button").unwrap().dyn_into().unwrap();
	button.click();
	assert_eq!(clicks.get(), 1);

	renderer.render(create_node("div", None, children![]), root).unwrap();
	button.click();
	assert_eq!(clicks.get(), 1);

	renderer.unmount(root).unwrap();
}

#[wasm_bindgen_test]
fn patch_keeps_nodes() {
	init_log();
	let host = Rc::new(WebHost::new().unwrap());
	let root = container(&host);
	let mut renderer = Renderer::new(Rc::clone(&host));

	renderer.render(create_node("p", Some(props! { "className" => "a" }), children!["one"]), root).unwrap();
	let p = host.child_nodes(root).unwrap()[0];
	renderer.render(create_node("p", Some(props! { "className" => "b" }), children!["two"]), root).unwrap();

	assert_eq!(host.child_nodes(root).unwrap(), vec![p]);
	assert_eq!(host.node(root).unwrap().unchecked_into::<HtmlElement>().inner_html(), r#"<p class="b">two</p>"#);
	renderer.unmount(root).unwrap();
}
