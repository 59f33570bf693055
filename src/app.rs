//! The application-level render entry point: route resolution, redirects and re-rendering on change.

use crate::{
	diff::Renderer,
	error::Error,
	host::{Host, NodeId},
	node::Child,
	observer::Subscribe,
	router::Navigate,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{error, info, instrument, trace, warn};

/// Redirect chains longer than this fail with [`Error::RedirectLoop`].
const MAX_REDIRECTS: u8 = 8;

/// Raised by route views that can't be shown in the current state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NavigationError {
	/// The page requires being logged in.
	#[error("authentication required")]
	Unauthorized,
	/// The page is pointless when logged in, like the login page.
	#[error("already authenticated")]
	Forbidden,
}

type View = Rc<dyn Fn() -> Result<Child, NavigationError>>;

/// The route table.
pub struct Routes {
	routes: HashMap<String, View>,
	not_found: Rc<dyn Fn() -> Child>,
	login_path: String,
	home_path: String,
}

impl Routes {
	/// An empty table whose not-found view is `not_found`.
	pub fn new(not_found: impl 'static + Fn() -> Child) -> Self {
		Self {
			routes: HashMap::new(),
			not_found: Rc::new(not_found),
			login_path: "/login".to_owned(),
			home_path: "/".to_owned(),
		}
	}

	#[must_use]
	pub fn route(mut self, path: impl Into<String>, view: impl 'static + Fn() -> Result<Child, NavigationError>) -> Self {
		self.routes.insert(path.into(), Rc::new(view));
		self
	}

	/// Where [`NavigationError::Unauthorized`] redirects to. Defaults to `/login`.
	#[must_use]
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();
		self
	}

	/// Where [`NavigationError::Forbidden`] redirects to. Defaults to `/`.
	#[must_use]
	pub fn home_path(mut self, path: impl Into<String>) -> Self {
		self.home_path = path.into();
		self
	}

	/// Builds the view for `path`. Unmatched paths get the not-found view.
	pub fn resolve(&self, path: &str) -> Result<Child, NavigationError> {
		match self.routes.get(path) {
			Some(view) => view(),
			None => {
				trace!(path, "No matching route.");
				Ok((self.not_found)())
			}
		}
	}

	#[must_use]
	pub fn redirect_for(&self, error: NavigationError) -> &str {
		match error {
			NavigationError::Unauthorized => &self.login_path,
			NavigationError::Forbidden => &self.home_path,
		}
	}
}

impl Debug for Routes {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Routes")
			.field("paths", &self.routes.keys().collect::<Vec<_>>())
			.field("login_path", &self.login_path)
			.field("home_path", &self.home_path)
			.finish_non_exhaustive()
	}
}

/// Renders the page for the router's current path into a single mount container.
///
/// The router and any stores are injected, so the app can be driven by either router variant
/// and tested without a browser.
pub struct App<H: Host, N: Navigate> {
	renderer: RefCell<Renderer<H>>,
	container: NodeId,
	router: N,
	routes: Routes,
	redirecting: Cell<bool>,
	redirects: Cell<u8>,
}

impl<H: 'static + Host, N: 'static + Navigate> App<H, N> {
	pub fn new(renderer: Renderer<H>, container: NodeId, router: N, routes: Routes) -> Rc<Self> {
		Rc::new(Self {
			renderer: RefCell::new(renderer),
			container,
			router,
			routes,
			redirecting: Cell::new(false),
			redirects: Cell::new(0),
		})
	}

	pub fn router(&self) -> &N {
		&self.router
	}

	#[must_use]
	pub fn container(&self) -> NodeId {
		self.container
	}

	/// Borrows the renderer, for example to inspect its event manager.
	pub fn renderer(&self) -> core::cell::Ref<'_, Renderer<H>> {
		self.renderer.borrow()
	}

	/// Re-renders whenever the router or one of `sources` changes, then renders once.
	pub fn start(self: &Rc<Self>, sources: &[&dyn Subscribe]) -> Result<(), Error> {
		let this: Weak<Self> = Rc::downgrade(self);
		let callback: Rc<dyn Fn()> = Rc::new(move || {
			if let Some(app) = this.upgrade() {
				if app.redirecting.get() {
					return trace!("Change caused by a redirect. The redirecting render continues.");
				}
				if let Err(error) = app.render() {
					error!("Render after change failed: {}", error);
				}
			}
		});
		self.router.subscribe(Rc::clone(&callback));
		for source in sources {
			source.subscribe(Rc::clone(&callback));
		}
		self.render()
	}

	/// Renders the view for the current path.
	///
	/// Views that fail with a [`NavigationError`] don't render anything themselves; the router is
	/// redirected instead, and the target page rendered.
	///
	/// # Errors
	///
	/// Failures of the redirected render are returned here too, even after [`App::start`].
	#[instrument(skip(self))]
	pub fn render(&self) -> Result<(), Error> {
		let path = self.router.path();
		match self.routes.resolve(&path) {
			Ok(view) => {
				self.redirects.set(0);
				let mut renderer = self.renderer.try_borrow_mut().map_err(|_| Error::Reentrant(self.container))?;
				renderer.render(view, self.container)
			}
			Err(navigation_error) => {
				let target = self.routes.redirect_for(navigation_error).to_owned();
				let hops = self.redirects.get() + 1;
				if hops > MAX_REDIRECTS {
					self.redirects.set(0);
					return Err(Error::RedirectLoop(target));
				}
				if target == path {
					warn!(path = path.as_str(), "Redirecting to the same path.");
					self.redirects.set(0);
					return Err(Error::RedirectLoop(target));
				}
				info!(from = path.as_str(), to = target.as_str(), "{}. Redirecting.", navigation_error);
				self.redirects.set(hops);
				self.redirecting.set(true);
				self.router.push(&target);
				self.redirecting.set(false);
				self.render()
			}
		}
	}
}

impl<H: Host, N: Navigate> Debug for App<H, N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("App")
			.field("container", &self.container)
			.field("path", &self.router.path())
			.field("routes", &self.routes)
			.field("redirecting", &self.redirecting.get())
			.finish_non_exhaustive()
	}
}
