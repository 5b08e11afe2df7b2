use leptos::prelude::*;
use leptos_router::components::A;

/// Fallback for unknown paths.
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<section class="panel centered">
			<h1>"Page not found"</h1>
			<A href="/knowledge-base">"Back to the knowledge base"</A>
		</section>
	}
}
