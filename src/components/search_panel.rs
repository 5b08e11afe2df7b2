use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};

use crate::api::{BackendClient, SearchResponse};
use crate::session::use_session;

pub const NO_RESULTS_MESSAGE: &str = "No results found for your search.";

/// What the result area shows.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchView {
	Idle,
	Loading,
	Error(String),
	Empty,
	Results { count: usize, query: String },
}

pub fn search_view(
	loading: bool,
	error: Option<&str>,
	response: Option<&SearchResponse>,
	has_searched: bool,
) -> SearchView {
	if loading {
		return SearchView::Loading;
	}
	if let Some(error) = error {
		return SearchView::Error(error.to_string());
	}
	match response {
		Some(r) if !r.results.is_empty() => SearchView::Results {
			count: r.results.len(),
			query: r.shown_query().to_string(),
		},
		_ if has_searched => SearchView::Empty,
		_ => SearchView::Idle,
	}
}

/// Free-text search against one index. Query and results live in the session.
#[component]
pub fn SearchPanel(#[prop(into)] index_id: String) -> impl IntoView {
	let session = use_session();
	let client = use_context::<BackendClient>();
	session.enter_search(&index_id);

	let loading = RwSignal::new(false);
	let error = RwSignal::new(None::<String>);

	let run_search = move || {
		let query = session.search_query.get_untracked();
		if query.trim().is_empty() || loading.get_untracked() {
			return;
		}
		let Some(client) = client.clone() else {
			warn!("search: no backend client in context");
			return;
		};
		let index_id = index_id.clone();
		loading.set(true);
		error.set(None);
		session.search_response.set(None);
		session.has_searched.set(true);
		spawn_local(async move {
			info!("search: {query:?} in {index_id}");
			match client.search_text(&index_id, &query).await {
				Ok(response) => session.search_response.set(Some(response)),
				Err(e) => error.set(Some(e.to_string())),
			}
			loading.set(false);
		});
	};
	let run_on_enter = run_search.clone();

	let view_state = Memo::new(move |_| {
		let response = session.search_response.get();
		let has_searched = session.has_searched.get();
		error.with(|e| search_view(loading.get(), e.as_deref(), response.as_ref(), has_searched))
	});

	let hits = move || {
		session
			.search_response
			.get()
			.map(|r| r.results)
			.unwrap_or_default()
	};

	view! {
		<section class="panel search-panel">
			<div class="form-row">
				<input
					class="text-field"
					type="text"
					placeholder="Enter your search query"
					prop:value=move || session.search_query.get()
					on:input=move |ev| session.search_query.set(event_target_value(&ev))
					on:keydown=move |ev: web_sys::KeyboardEvent| {
						if ev.key() == "Enter" {
							run_on_enter();
						}
					}
				/>
				<button
					class="button primary"
					disabled=move || {
						loading.get() || session.search_query.with(|q| q.trim().is_empty())
					}
					on:click=move |_| run_search()
				>
					"Search"
				</button>
				<Show when=move || {
					session.has_searched.get() || session.search_query.with(|q| !q.is_empty())
				}>
					<button
						class="button outlined"
						on:click=move |_| {
							session.clear_search();
							error.set(None);
						}
					>
						"Clear"
					</button>
				</Show>
			</div>
			{move || match view_state.get() {
				SearchView::Idle => ().into_any(),
				SearchView::Loading => view! { <p class="status">"Loading..."</p> }.into_any(),
				SearchView::Error(msg) => {
					view! { <p class="error">{format!("Error: {msg}")}</p> }.into_any()
				}
				SearchView::Empty => {
					view! { <p class="status">{NO_RESULTS_MESSAGE}</p> }.into_any()
				}
				SearchView::Results { count, query } => {
					view! {
						<p class="status">
							{format!("Showing {count} results for ")}<strong>{query}</strong>
						</p>
						<table class="result-table">
							<thead>
								<tr>
									<th>"Score"</th>
									<th>"Link"</th>
									<th>"Content"</th>
								</tr>
							</thead>
							<tbody>
								<For
									each=hits
									key=|hit| hit.key()
									children=|hit| {
										let score = hit.score.to_string();
										view! {
											<tr>
												<td>
													<span class="score">{score}</span>
												</td>
												<td class="link">
													<a
														href=hit.url.clone()
														target="_blank"
														rel="noopener noreferrer"
													>
														{hit.url.clone()}
													</a>
												</td>
												<td class="content">{hit.excerpt().to_string()}</td>
											</tr>
										}
									}
								/>
							</tbody>
						</table>
					}
						.into_any()
				}
			}}
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::SearchHit;

	#[test]
	fn empty_results_after_search_are_not_an_error() {
		let response: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
		assert_eq!(search_view(false, None, Some(&response), true), SearchView::Empty);
	}

	#[test]
	fn nothing_shown_before_first_search() {
		assert_eq!(search_view(false, None, None, false), SearchView::Idle);
	}

	#[test]
	fn loading_and_errors_take_precedence() {
		assert_eq!(search_view(true, Some("x"), None, true), SearchView::Loading);
		assert_eq!(
			search_view(false, Some("network error: offline"), None, true),
			SearchView::Error("network error: offline".into())
		);
	}

	#[test]
	fn results_header_prefers_suggestion() {
		let response = SearchResponse {
			results: vec![SearchHit::default(), SearchHit::default()],
			suggestion_text: Some("rust lang".into()),
			original_query: Some("rust lagn".into()),
		};
		assert_eq!(
			search_view(false, None, Some(&response), true),
			SearchView::Results {
				count: 2,
				query: "rust lang".into()
			}
		);
	}
}
