#![doc(html_root_url = "https://docs.rs/sapling-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod app;
pub mod diff;
pub mod error;
pub mod event;
pub mod host;
pub mod load;
pub mod materialize;
pub mod memory;
pub mod node;
pub mod normalize;
pub mod observer;
pub mod router;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{App, NavigationError, Routes};
pub use diff::{Options, Renderer};
pub use error::Error;
pub use event::{Event, EventManager, Handler};
pub use host::{Host, HostError, NodeId, NodeKind};
pub use materialize::materialize;
pub use memory::Document;
pub use node::{create_node, Child, Component, Lazy, NodeType, PropValue, Props, VNode};
pub use normalize::{normalize, Element, Normalized};
pub use observer::{Observer, Subscribe};
pub use router::{HashRouter, HistoryRouter, Location, MemoryLocation, Navigate};
pub use store::Store;
