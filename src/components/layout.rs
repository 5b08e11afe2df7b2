use leptos::prelude::*;
use leptos_router::components::A;

use crate::session::use_session;

/// Fixed tab bar above the routed page.
#[component]
pub fn Shell(children: Children) -> impl IntoView {
	let session = use_session();

	view! {
		<div class="shell">
			<nav class="tabs">
				<A href="/knowledge-base">"Knowledge Base"</A>
				<A href="/build">"Build New Knowledge"</A>
				<A href="/scrape">"Scrape"</A>
				<A href="/admin">
					{move || if session.admin.get() { "Admin (signed in)" } else { "Admin" }}
				</A>
			</nav>
			<main class="page">{children()}</main>
		</div>
	}
}
