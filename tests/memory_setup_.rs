#![allow(dead_code)]

use sapling_dom::{Document, Host, NodeId, Renderer};
use std::{cell::Cell, rc::Rc};

/// Installs a test subscriber once per test binary. Set `RUST_LOG` to see output.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A document with a `<body>` to render into.
pub fn setup() -> (Rc<Document>, NodeId) {
	init_tracing();
	let document = Rc::new(Document::new());
	let body = document.create_element("body").unwrap();
	(document, body)
}

pub fn renderer() -> (Renderer<Document>, Rc<Document>, NodeId) {
	let (document, body) = setup();
	(Renderer::new(Rc::clone(&document)), document, body)
}

/// A shared call counter.
#[derive(Clone, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bump(&self) {
		self.0.set(self.0.get() + 1);
	}

	pub fn get(&self) -> usize {
		self.0.get()
	}
}
