use leptos::prelude::*;

use crate::api::TaskSummary;

/// Horizontal summary of one task, used above the search panel.
#[component]
pub fn TaskDetails(#[prop(into)] task: Signal<Option<TaskSummary>>) -> impl IntoView {
	let field = move |f: fn(&TaskSummary) -> String| {
		move || task.with(|t| t.as_ref().map(f).unwrap_or_default())
	};

	view! {
		<div class="task-details">
			<div>
				<span class="caption">"Task ID"</span>
				<p>{field(|t| t.task_id.clone())}</p>
			</div>
			<div>
				<span class="caption">"Scraping URL"</span>
				<p>{field(|t| t.scraping_url.clone())}</p>
			</div>
			<div>
				<span class="caption">"Status"</span>
				<p>
					<span class=move || {
						task.with(|t| t.as_ref().map(|t| t.status.badge_class()).unwrap_or("badge"))
					}>{field(|t| t.status.to_string())}</span>
				</p>
			</div>
			<div>
				<span class="caption">"Created At"</span>
				<p>{field(TaskSummary::created_display)}</p>
			</div>
			<div>
				<span class="caption">"Files"</span>
				<p>{field(|t| t.processed_files.to_string())}</p>
			</div>
		</div>
	}
}
