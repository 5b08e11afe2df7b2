use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::api::{BackendClient, ScrapeResponse};
use crate::components::log_viewer::LogViewer;
use crate::config::AppConfig;
use crate::poller::{PollGuard, PollStep, PollTracker, poll_until_settled};
use crate::session::use_session;

/// Start a crawl and follow its status.
#[component]
pub fn Scrape() -> impl IntoView {
	let session = use_session();
	let config = use_context::<AppConfig>().unwrap_or_default();
	let client =
		use_context::<BackendClient>().unwrap_or_else(|| BackendClient::from_config(&config));
	let (interval_ms, max_retries) = (config.poll_interval_ms, config.max_poll_retries);

	let loading = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);
	let log_reset = RwSignal::new(0_u64);
	let poll = StoredValue::new_local(None::<PollGuard>);
	let task_id = Signal::derive(move || {
		session
			.scrape_response
			.with(|r| r.as_ref().map(|r| r.task_id.clone()).unwrap_or_default())
	});

	let start = move || {
		let target = session.scrape_url.get_untracked().trim().to_string();
		if target.is_empty() || loading.get_untracked() {
			return;
		}
		let (guard, cancel) = PollGuard::arm();
		poll.set_value(Some(guard));
		session.begin_scrape();
		log_reset.update(|n| *n += 1);
		loading.set(true);
		error.set(None);

		let client = client.clone();
		spawn_local(async move {
			let started = match client.scrape_web(&target).await {
				Ok(started) => started,
				Err(e) => {
					warn!("scrape: submit failed: {e}");
					error.set(Some(e.to_string()));
					loading.set(false);
					return;
				}
			};
			info!("scrape: task {} started", started.task_id);
			let id = started.task_id.clone();
			session.scrape_response.set(Some(started));
			loading.set(false);

			let fetch = move || {
				let client = client.clone();
				let id = id.clone();
				async move { client.scrape_status(&id).await }
			};
			let tracker = PollTracker::new(max_retries);
			let step = poll_until_settled(fetch, tracker, interval_ms, cancel, |_| {}).await;
			let Some(step) = step else {
				return;
			};
			if let Some(message) = step.failure_message() {
				error.set(Some(message.to_string()));
			}
			if let PollStep::Completed(status) | PollStep::Failed(status) = step {
				session.scrape_response.update(|r| {
					if let Some(r) = r {
						r.status = status.status;
						if let Some(message) = status.message {
							r.message = message;
						}
					}
				});
			}
		});
	};
	let start_on_enter = start.clone();

	let on_clear = move |_| {
		poll.set_value(None);
		session.scrape_url.set(String::new());
		session.scrape_response.set(None);
		error.set(None);
		log_reset.update(|n| *n += 1);
	};

	let result = move || {
		session.scrape_response.get().map(|r: ScrapeResponse| {
			let url = session.scrape_url.get_untracked();
			let href = url.clone();
			view! {
				<table class="task-table">
					<thead>
						<tr>
							<th>"Task ID"</th>
							<th>"Scraping Status"</th>
							<th>"URL Scraped"</th>
						</tr>
					</thead>
					<tbody>
						<tr>
							<td>{r.task_id}</td>
							<td>
								<span class=r.status.badge_class()>{r.status.to_string()}</span>
								" "
								{r.message}
							</td>
							<td>
								<a href=href target="_blank" rel="noopener noreferrer">
									{url}
								</a>
							</td>
						</tr>
					</tbody>
				</table>
			}
		})
	};

	view! {
		<section class="panel">
			<div class="panel-head">
				<h2>"Scrape Content"</h2>
				<Show when=move || session.scrape_response.with(Option::is_some)>
					<button class="button outlined" on:click=on_clear>
						"Clear Data"
					</button>
				</Show>
			</div>
			<div class="form-row">
				<input
					class="text-field wide"
					type="url"
					placeholder="Enter URL to scrape"
					prop:value=move || session.scrape_url.get()
					on:input=move |ev| session.scrape_url.set(event_target_value(&ev))
					on:keydown=move |ev: web_sys::KeyboardEvent| {
						if ev.key() == "Enter" {
							start_on_enter();
						}
					}
				/>
				<button
					class="button primary"
					disabled=move || {
						loading.get() || session.scrape_url.with(|u| u.trim().is_empty())
					}
					on:click=move |_| start()
				>
					"Start Scraping"
				</button>
			</div>
			<Show when=move || loading.get()>
				<p class="status">"Scraping..."</p>
			</Show>
			{move || error.get().map(|e| view! { <p class="error">{format!("Error: {e}")}</p> })}
			{result}
			<LogViewer task_id=task_id reset=log_reset />
		</section>
	}
}
