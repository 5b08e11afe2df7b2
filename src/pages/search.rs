use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;
use log::warn;

use crate::api::{BackendClient, TaskSummary};
use crate::components::search_panel::SearchPanel;
use crate::components::task_details::TaskDetails;
use crate::session::use_session;

/// Search view for one index, entered from a task row.
#[component]
pub fn Search() -> impl IntoView {
	let params = use_params_map();
	let task_id = Memo::new(move |_| params.with(|p| p.get("task_id")).unwrap_or_default());

	move || view! { <SearchEntry task_id=task_id.get() /> }
}

#[component]
fn SearchEntry(task_id: String) -> impl IntoView {
	let session = use_session();
	let task = RwSignal::new(None::<TaskSummary>);

	match session.take_selected_task() {
		Some(selected) if selected.task_id == task_id => task.set(Some(selected)),
		_ => {
			// opened directly: fetch the summary instead
			if let Some(client) = use_context::<BackendClient>() {
				let id = task_id.clone();
				spawn_local(async move {
					match client.text_index(&id).await {
						Ok(detail) => task.set(Some(detail.summary)),
						Err(e) => warn!("search: no details for {id}: {e}"),
					}
				});
			}
		}
	}

	view! {
		<section class="search-page">
			<div class="back">
				<A href="/knowledge-base" attr:class="icon-button">
					"←"
				</A>
			</div>
			<TaskDetails task=task />
			<SearchPanel index_id=task_id />
		</section>
	}
}
