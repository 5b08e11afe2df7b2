use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;
use log::{debug, error};

use crate::api::{BackendClient, IndexDetail};
use crate::components::cluster_browser::ClusterBrowser;
use crate::components::force_graph::{GraphPayload, NetworkGraph};
use crate::components::task_table::TaskTable;

const FETCH_FAILED: &str = "Failed to fetch knowledge base details";

#[derive(Clone, Debug, PartialEq)]
enum DetailState {
	Loading,
	Failed,
	Missing,
	Ready(Box<IndexDetail>),
}

/// One index: its task row, the link graph and the clusters.
#[component]
pub fn ViewIndex() -> impl IntoView {
	let params = use_params_map();
	let client = use_context::<BackendClient>();
	let state = RwSignal::new(DetailState::Loading);
	let graph = RwSignal::new(GraphPayload::default());

	Effect::new(move |_| {
		let task_id = params.with(|p| p.get("task_id")).unwrap_or_default();
		if task_id.is_empty() {
			state.set(DetailState::Missing);
			return;
		}
		let Some(client) = client.clone() else {
			state.set(DetailState::Failed);
			return;
		};
		state.set(DetailState::Loading);
		spawn_local(async move {
			match client.text_index(&task_id).await {
				Ok(detail) => {
					debug!(
						"index {task_id}: graph={} clusters={}",
						detail.webpage_graph.is_some(),
						detail.clustering_data.as_ref().map_or(0, |c| c.len())
					);
					if let Some(payload) = detail.webpage_graph.clone() {
						graph.set(payload);
					}
					state.set(DetailState::Ready(Box::new(detail)));
				}
				Err(e) if e.is_not_found() => state.set(DetailState::Missing),
				Err(e) => {
					error!("index {task_id}: {e}");
					state.set(DetailState::Failed);
				}
			}
		});
	});

	view! {
		<section class="panel">
			{move || match state.get() {
				DetailState::Loading => {
					view! {
						<div class="skeleton">
							<div class="skeleton-row" />
							<div class="skeleton-block" />
						</div>
					}
						.into_any()
				}
				DetailState::Failed => {
					view! { <p class="centered error">{FETCH_FAILED}</p> }.into_any()
				}
				DetailState::Missing => {
					view! { <p class="centered error">"No data found"</p> }.into_any()
				}
				DetailState::Ready(detail) => {
					let IndexDetail { summary, webpage_graph, clustering_data } = *detail;
					view! {
						<TaskTable tasks=vec![summary] />
						{webpage_graph.map(|_| view! { <NetworkGraph data=graph /> })}
						{clustering_data
							.map(|clusters| {
								view! {
									<div class="clusters">
										<ClusterBrowser clusters=clusters />
									</div>
								}
							})}
					}
						.into_any()
				}
			}}
		</section>
	}
}
