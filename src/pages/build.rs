use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::api::BackendClient;
use crate::components::log_viewer::LogViewer;
use crate::components::task_table::TaskTable;
use crate::config::AppConfig;
use crate::poller::{PollGuard, PollStep, PollTracker, poll_until_settled};
use crate::session::use_session;

/// Submit a site for indexing and follow the build to completion.
#[component]
pub fn Build() -> impl IntoView {
	let session = use_session();
	let config = use_context::<AppConfig>().unwrap_or_default();
	let client =
		use_context::<BackendClient>().unwrap_or_else(|| BackendClient::from_config(&config));
	let (interval_ms, max_retries) = (config.poll_interval_ms, config.max_poll_retries);

	let url = RwSignal::new(String::new());
	let task_id = RwSignal::new(String::new());
	let loading = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);
	let retries = RwSignal::new(0_u32);
	let log_reset = RwSignal::new(0_u64);
	let poll = StoredValue::new_local(None::<PollGuard>);

	let submit_client = client.clone();
	let start = move || {
		let target = url.get_untracked().trim().to_string();
		if target.is_empty() || loading.get_untracked() {
			return;
		}
		let (guard, cancel) = PollGuard::arm();
		poll.set_value(Some(guard));
		log_reset.update(|n| *n += 1);
		session.build_result.set(None);
		task_id.set(String::new());
		loading.set(true);
		error.set(None);
		retries.set(0);

		let client = submit_client.clone();
		spawn_local(async move {
			let started = match client.build_index(&target).await {
				Ok(started) => started,
				Err(e) => {
					warn!("build: submit failed: {e}");
					error.set(Some(e.to_string()));
					loading.set(false);
					return;
				}
			};
			let id = started.task_id;
			info!("build: task {id} started for {target}");
			task_id.set(id.clone());

			let fetch = {
				let id = id.clone();
				move || {
					let client = client.clone();
					let id = id.clone();
					async move { client.clustering_status(&id).await }
				}
			};
			let outcome = poll_until_settled(
				fetch,
				PollTracker::new(max_retries),
				interval_ms,
				cancel,
				move |n| retries.set(n),
			)
			.await;
			let Some(step) = outcome else {
				return;
			};
			if let Some(message) = step.failure_message() {
				error.set(Some(message.to_string()));
			}
			if let PollStep::Completed(status) = step {
				info!("build: task {id} completed");
				session.build_result.set(Some(status.into_summary(&id)));
			}
			retries.set(0);
			loading.set(false);
		});
	};
	let start_on_enter = start.clone();

	let on_cancel = move |_| {
		let id = task_id.get_untracked();
		if id.is_empty() {
			return;
		}
		poll.set_value(None);
		let client = client.clone();
		spawn_local(async move {
			match client.kill_task(&id).await {
				Ok(()) => {
					info!("build: task {id} cancelled");
					error.set(Some("Build cancelled".into()));
				}
				Err(e) => error.set(Some(e.to_string())),
			}
			loading.set(false);
		});
	};

	let on_clear = move |_| {
		poll.set_value(None);
		session.build_result.set(None);
		url.set(String::new());
		task_id.set(String::new());
		error.set(None);
		loading.set(false);
		retries.set(0);
		log_reset.update(|n| *n += 1);
	};

	let completed = Signal::derive(move || {
		session
			.build_result
			.get()
			.filter(|_| error.with(Option::is_none) && !loading.get())
			.map(|task| vec![task])
	});

	view! {
		<section class="panel">
			<div class="form-row">
				<input
					class="text-field wide"
					type="url"
					placeholder="Enter website URL to build knowledge base"
					prop:value=move || url.get()
					disabled=move || loading.get()
					on:input=move |ev| url.set(event_target_value(&ev))
					on:keydown=move |ev: web_sys::KeyboardEvent| {
						if ev.key() == "Enter" {
							start_on_enter();
						}
					}
				/>
				<button
					class="button primary"
					disabled=move || loading.get() || url.with(|u| u.trim().is_empty())
					on:click=move |_| start()
				>
					{move || if loading.get() { "Building..." } else { "Start Building" }}
				</button>
				<Show when=move || {
					session.admin.get() && loading.get() && task_id.with(|t| !t.is_empty())
				}>
					<button class="button danger" on:click=on_cancel.clone()>
						"Cancel"
					</button>
				</Show>
				<Show when=move || {
					session.build_result.with(Option::is_some) || !task_id.with(String::is_empty)
				}>
					<button class="button outlined" on:click=on_clear>
						"Clear"
					</button>
				</Show>
			</div>
			<Show when=move || loading.get()>
				<p class="status">
					{move || match retries.get() {
						0 => "Building in progress... This may take time.".to_string(),
						n => format!("Initializing... (Attempt {n}/{max_retries})"),
					}}
				</p>
			</Show>
			{move || error.get().map(|e| view! { <p class="error">{format!("Error: {e}")}</p> })}
			{move || completed.get().map(|tasks| view! { <TaskTable tasks=tasks /> })}
			<LogViewer task_id=task_id reset=log_reset />
		</section>
	}
}
