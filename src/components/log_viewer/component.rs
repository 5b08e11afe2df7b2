use gloo_timers::callback::Interval;
use leptos::prelude::*;

use super::channel::{ChannelEvent, ChannelOptions, LogChannel, socket_url};
use super::queue::{Epoch, LogQueue};
use crate::config::AppConfig;

/// Live log panel for one backend task.
///
/// Records are revealed one per drain tick. Changing `task_id`, or bumping
/// `reset`, drops the current subscription and both lists before the next
/// subscription opens.
#[component]
pub fn LogViewer(
	#[prop(into)] task_id: Signal<String>,
	#[prop(optional, into)] reset: Option<Signal<u64>>,
) -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let queue = RwSignal::new(LogQueue::new(&config.log_noise));
	let connected = RwSignal::new(false);
	let channel = StoredValue::new_local(None::<LogChannel>);
	let log_box = NodeRef::<leptos::html::Div>::new();

	let drain = Interval::new(config.log_drain_interval_ms, move || {
		queue.maybe_update(|q| q.drain_one().is_some());
	});
	let _drain = StoredValue::new_local(drain);

	Effect::new(move |_| {
		let id = task_id.get();
		if let Some(reset) = reset {
			reset.track();
		}

		// old subscription first, so nothing it still delivers can land in the new lists
		channel.update_value(|c| {
			if let Some(old) = c.take() {
				old.close();
			}
		});
		let mut epoch = Epoch::default();
		queue.update(|q| epoch = q.reset());
		connected.set(false);
		if id.is_empty() {
			return;
		}

		let options = ChannelOptions {
			url: socket_url(&config.api_base_url),
			task_id: id,
			reconnect_attempts: config.reconnect_attempts,
			reconnect_delay_ms: config.reconnect_delay_ms,
		};
		let opened = LogChannel::open(options, move |event| match event {
			ChannelEvent::Record(record) => {
				queue.maybe_update(|q| q.push_for(epoch, record));
			}
			// health of a replaced subscription is not ours to show
			_ if queue.with_untracked(|q| q.epoch()) != epoch => {}
			ChannelEvent::Connected => connected.set(true),
			ChannelEvent::Disconnected => connected.set(false),
		});
		channel.set_value(Some(opened));
	});

	Effect::new(move |_| {
		queue.with(|q| q.displayed_len());
		if let Some(el) = log_box.get() {
			el.set_scroll_top(el.scroll_height());
		}
	});

	let counts = move || {
		queue.with(|q| match q.pending_len() {
			0 => format!("Logs: {}", q.displayed_len()),
			pending => format!("Logs: {} ({pending} pending)", q.displayed_len()),
		})
	};

	view! {
		<Show when=move || queue.with(|q| q.has_received())>
			<section class="log-viewer">
				<header class="log-header">
					<h2>"Live Logs"</h2>
					<div class="log-status">
						<span>{counts}</span>
						<span
							class="health-dot"
							class:connected=move || connected.get()
							title=move || if connected.get() { "connected" } else { "disconnected" }
						/>
					</div>
					<div class="progress-track">
						<div
							class="progress-fill"
							style:width=move || format!("{:.0}%", queue.with(|q| q.progress()))
						/>
					</div>
				</header>
				<div class="log-entries" node_ref=log_box>
					<For
						each=move || queue.with(|q| q.displayed().to_vec())
						key=|entry| entry.seq
						children=|entry| {
							let record = entry.record;
							view! {
								<div class="log-entry">
									<span class="log-time">{record.display_time()}</span>
									<span class="log-level" style:color=record.level.color()>
										{format!("[{}]", record.level)}
									</span>
									<span class="log-message">{record.message}</span>
								</div>
							}
						}
					/>
				</div>
			</section>
		</Show>
	}
}
