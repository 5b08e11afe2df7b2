use std::collections::BTreeMap;

use leptos::prelude::*;

use crate::api::Cluster;

/// Clusters matching `term`, each keeping only its matching documents.
///
/// A cluster survives when a document path or preview contains the term,
/// or when one of its keywords does. Matching ignores case; an empty term
/// keeps everything.
pub fn filter_clusters(
	clusters: &BTreeMap<String, Cluster>,
	term: &str,
) -> BTreeMap<String, Cluster> {
	let term = term.trim().to_lowercase();
	if term.is_empty() {
		return clusters.clone();
	}
	let hit = |text: &str| text.to_lowercase().contains(&term);

	clusters
		.iter()
		.filter_map(|(id, cluster)| {
			let documents: Vec<_> = cluster
				.documents
				.iter()
				.filter(|doc| hit(&doc.file_path) || hit(&doc.preview))
				.cloned()
				.collect();
			if documents.is_empty() && !cluster.keywords.iter().any(|k| hit(k)) {
				return None;
			}
			Some((
				id.clone(),
				Cluster {
					documents,
					..cluster.clone()
				},
			))
		})
		.collect()
}

#[component]
pub fn ClusterBrowser(clusters: BTreeMap<String, Cluster>) -> impl IntoView {
	let term = RwSignal::new(String::new());
	let selected = RwSignal::new(None::<String>);
	let clusters = StoredValue::new(clusters);
	let filtered =
		Memo::new(move |_| term.with(|t| clusters.with_value(|c| filter_clusters(c, t))));

	let cards = move || {
		filtered
			.get()
			.into_iter()
			.map(|(id, cluster)| {
				let card_id = id.clone();
				let is_selected = {
					let id = id.clone();
					move || selected.get().as_deref() == Some(id.as_str())
				};
				let keywords = cluster
					.keywords
					.into_iter()
					.map(|k| view! { <span class="chip">{k}</span> })
					.collect_view();
				view! {
					<div
						class="cluster-card"
						class:selected=is_selected
						on:click=move |_| {
							selected
								.update(|s| {
									*s = if s.as_deref() == Some(card_id.as_str()) {
										None
									} else {
										Some(card_id.clone())
									};
								})
						}
					>
						<div class="cluster-head">
							<h3>{id}</h3>
							<span class="caption">{format!("{} docs", cluster.size)}</span>
						</div>
						<div class="chips">{keywords}</div>
					</div>
				}
			})
			.collect_view()
	};

	let documents = move || {
		let id = selected.get()?;
		let cluster = filtered.with(|f| f.get(&id).cloned())?;
		let items = cluster
			.documents
			.into_iter()
			.map(|doc| {
				let href = doc.url.clone().unwrap_or_else(|| doc.file_path.clone());
				view! {
					<li>
						<a href=href target="_blank" rel="noopener noreferrer">
							{doc.file_path}
						</a>
						<p class="preview">{doc.preview}</p>
					</li>
				}
			})
			.collect_view();
		Some(view! {
			<div class="cluster-documents">
				<h3>{format!("Documents in {id}")}</h3>
				<ul>{items}</ul>
			</div>
		})
	};

	view! {
		<section class="cluster-browser">
			<input
				class="text-field"
				type="search"
				placeholder="Search clusters, documents, or keywords..."
				prop:value=move || term.get()
				on:input=move |ev| term.set(event_target_value(&ev))
			/>
			<div class="cluster-grid">{cards}</div>
			{documents}
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::api::ClusterDocument;

	fn doc(index: u64, path: &str, preview: &str) -> ClusterDocument {
		ClusterDocument {
			index,
			file_path: path.into(),
			preview: preview.into(),
			..ClusterDocument::default()
		}
	}

	fn sample() -> BTreeMap<String, Cluster> {
		BTreeMap::from([
			(
				"cluster_0".to_string(),
				Cluster {
					size: 2,
					keywords: vec!["rust".into(), "wasm".into()],
					documents: vec![
						doc(0, "docs/intro.txt", "Getting started"),
						doc(1, "docs/api.txt", "HTTP API"),
					],
				},
			),
			(
				"cluster_1".to_string(),
				Cluster {
					size: 1,
					keywords: vec!["pricing".into()],
					documents: vec![doc(2, "pricing.txt", "Plans and API limits")],
				},
			),
		])
	}

	#[test]
	fn empty_term_keeps_everything() {
		assert_eq!(filter_clusters(&sample(), "  "), sample());
	}

	#[test]
	fn documents_are_narrowed_to_matches() {
		let filtered = filter_clusters(&sample(), "api");
		assert_eq!(filtered.len(), 2);
		assert_eq!(filtered["cluster_0"].documents.len(), 1);
		assert_eq!(filtered["cluster_0"].documents[0].index, 1);
		// size stays the backend's figure
		assert_eq!(filtered["cluster_0"].size, 2);
	}

	#[test]
	fn keyword_match_keeps_cluster_without_documents() {
		let filtered = filter_clusters(&sample(), "WASM");
		assert_eq!(filtered.keys().collect::<Vec<_>>(), ["cluster_0"]);
		assert!(filtered["cluster_0"].documents.is_empty());
	}

	#[test]
	fn no_match_drops_cluster() {
		assert!(filter_clusters(&sample(), "kubernetes").is_empty());
	}
}
