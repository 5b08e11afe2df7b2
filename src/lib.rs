//! Leptos client-side front-end for the knowledge-base search backend.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod api;
mod components;
mod config;
mod error;
mod pages;
mod poller;
mod session;

use crate::api::BackendClient;
use crate::components::layout::Shell;
use crate::config::AppConfig;
use crate::session::provide_session;

// Top-Level pages
use crate::pages::admin::Admin;
use crate::pages::build::Build;
use crate::pages::knowledge_base::KnowledgeBase;
use crate::pages::not_found::NotFound;
use crate::pages::scrape::Scrape;
use crate::pages::search::Search;
use crate::pages::view_index::ViewIndex;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// The app router: index list, index detail, search, build, scrape and admin views.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = AppConfig::load();
	provide_context(BackendClient::from_config(&config));
	provide_context(config);
	provide_session();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		<Title text="Knowledge Base" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Shell>
				<Routes fallback=|| view! { <NotFound /> }>
					<Route path=path!("/") view=|| view! { <Redirect path="/knowledge-base" /> } />
					<Route path=path!("/knowledge-base") view=KnowledgeBase />
					<Route path=path!("/knowledge-base/view/:task_id") view=ViewIndex />
					<Route path=path!("/knowledge-base/search/:task_id") view=Search />
					<Route path=path!("/build") view=Build />
					<Route path=path!("/scrape") view=Scrape />
					<Route path=path!("/admin") view=Admin />
				</Routes>
			</Shell>
		</Router>
	}
}
