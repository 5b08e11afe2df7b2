use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};

use crate::api::{BackendClient, TaskSummary};
use crate::components::task_table::TaskTable;
use crate::session::use_session;

const FETCH_FAILED: &str = "Failed to fetch knowledge base data";

#[derive(Clone, Debug, PartialEq)]
enum ListState {
	Loading,
	Failed,
	Ready(Vec<TaskSummary>),
}

/// All indexes the backend knows about.
#[component]
pub fn KnowledgeBase() -> impl IntoView {
	let session = use_session();
	let client = use_context::<BackendClient>();
	let state = RwSignal::new(ListState::Loading);
	let reload = RwSignal::new(0_u32);
	let action_error = RwSignal::new(None::<String>);

	let list_client = client.clone();
	Effect::new(move |_| {
		reload.track();
		let Some(client) = list_client.clone() else {
			state.set(ListState::Failed);
			return;
		};
		spawn_local(async move {
			match client.list_indexes().await {
				Ok(tasks) => {
					info!("knowledge base: {} entries", tasks.len());
					state.set(ListState::Ready(tasks));
				}
				Err(e) => {
					error!("knowledge base: {e}");
					state.set(ListState::Failed);
				}
			}
		});
	});

	let on_delete = Callback::new(move |task_id: String| {
		let Some(client) = client.clone() else {
			return;
		};
		if !session.admin.get_untracked() {
			return;
		}
		action_error.set(None);
		spawn_local(async move {
			match client.delete_index(&task_id).await {
				Ok(()) => {
					info!("knowledge base: deleted {task_id}");
					reload.update(|n| *n += 1);
				}
				Err(e) => action_error.set(Some(e.to_string())),
			}
		});
	});

	let tasks = Signal::derive(move || match state.get() {
		ListState::Ready(tasks) => tasks,
		_ => Vec::new(),
	});

	view! {
		<section class="panel">
			{move || {
				action_error.get().map(|e| view! { <p class="error">{format!("Error: {e}")}</p> })
			}}
			{move || match state.get() {
				ListState::Loading => {
					view! { <div class="centered"><div class="spinner" /></div> }.into_any()
				}
				ListState::Failed => {
					view! { <p class="centered error">{FETCH_FAILED}</p> }.into_any()
				}
				ListState::Ready(t) if t.is_empty() => {
					view! { <p class="centered">"No knowledge base entries found"</p> }.into_any()
				}
				ListState::Ready(_) => {
					let on_delete = session.admin.get().then_some(on_delete);
					match on_delete {
						Some(cb) => view! { <TaskTable tasks=tasks on_delete=cb /> }.into_any(),
						None => view! { <TaskTable tasks=tasks /> }.into_any(),
					}
				}
			}}
		</section>
	}
}
