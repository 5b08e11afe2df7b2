use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::api::{TaskStatus, TaskSummary};
use crate::session::use_session;

pub fn view_path(task_id: &str) -> String {
	format!("/knowledge-base/view/{}", urlencoding::encode(task_id))
}

pub fn search_path(task_id: &str) -> String {
	format!("/knowledge-base/search/{}", urlencoding::encode(task_id))
}

/// One task with its View/Search actions, plus Delete when `on_delete` is set.
#[component]
pub fn TaskRow(
	index: usize,
	task: TaskSummary,
	#[prop(default = None)] on_delete: Option<Callback<String>>,
) -> impl IntoView {
	let session = use_session();
	let navigate = use_navigate();
	let searchable = task.status == TaskStatus::Completed;
	let selected = task.clone();
	let on_search = move |_| {
		let path = search_path(&selected.task_id);
		session.select_task(selected.clone());
		navigate(&path, NavigateOptions::default());
	};
	let task_id = task.task_id.clone();
	let delete = on_delete.map(|cb| {
		view! {
			<button
				class="button danger"
				disabled=move || !session.admin.get()
				on:click=move |_| cb.run(task_id.clone())
			>
				"Delete"
			</button>
		}
	});

	view! {
		<tr>
			<td>{index + 1}</td>
			<td>{task.task_id.clone()}</td>
			<td>
				<a href=task.scraping_url.clone() target="_blank" rel="noopener noreferrer">
					{task.scraping_url.clone()}
				</a>
			</td>
			<td>{task.processed_files}</td>
			<td>
				<span class=task.status.badge_class()>{task.status.to_string()}</span>
			</td>
			<td>{task.created_display()}</td>
			<td class="actions">
				<A href=view_path(&task.task_id) attr:class="button outlined">
					"View"
				</A>
				<button class="button outlined" disabled=!searchable on:click=on_search>
					"Search"
				</button>
				{delete}
			</td>
		</tr>
	}
}

#[component]
pub fn TaskTable(
	#[prop(into)] tasks: Signal<Vec<TaskSummary>>,
	#[prop(optional)] on_delete: Option<Callback<String>>,
) -> impl IntoView {
	view! {
		<table class="task-table">
			<thead>
				<tr>
					<th>"ID"</th>
					<th>"Task ID"</th>
					<th>"Scraping URL"</th>
					<th>"Files"</th>
					<th>"Status"</th>
					<th>"Created At"</th>
					<th class="actions">"Actions"</th>
				</tr>
			</thead>
			<tbody>
				{move || {
					tasks
						.get()
						.into_iter()
						.enumerate()
						.map(|(index, task)| {
							view! { <TaskRow index=index task=task on_delete=on_delete /> }
						})
						.collect_view()
				}}
			</tbody>
		</table>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn task_links_encode_ids() {
		assert_eq!(view_path("t1"), "/knowledge-base/view/t1");
		assert_eq!(search_path("a b"), "/knowledge-base/search/a%20b");
	}
}
