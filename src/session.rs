//! Cross-view state for one browser session.
//!
//! Replaces ad-hoc browser storage: every field is a reactive cell owned by
//! the app root and handed to views through context.

use leptos::prelude::*;
use log::warn;

use crate::api::{ScrapeResponse, SearchResponse, TaskSummary};

#[derive(Clone, Copy, Debug)]
pub struct Session {
	/// Last URL typed into the scrape form.
	pub scrape_url: RwSignal<String>,
	pub scrape_response: RwSignal<Option<ScrapeResponse>>,
	/// Last completed build, shown as a result row.
	pub build_result: RwSignal<Option<TaskSummary>>,
	selected_task: RwSignal<Option<TaskSummary>>,
	/// Index the stored search belongs to.
	pub search_index: RwSignal<Option<String>>,
	pub search_query: RwSignal<String>,
	pub search_response: RwSignal<Option<SearchResponse>>,
	pub has_searched: RwSignal<bool>,
	pub admin: RwSignal<bool>,
}

impl Session {
	pub fn new() -> Self {
		Self {
			scrape_url: RwSignal::new(String::new()),
			scrape_response: RwSignal::new(None),
			build_result: RwSignal::new(None),
			selected_task: RwSignal::new(None),
			search_index: RwSignal::new(None),
			search_query: RwSignal::new(String::new()),
			search_response: RwSignal::new(None),
			has_searched: RwSignal::new(false),
			admin: RwSignal::new(false),
		}
	}

	/// Hand a task to the search view that opens next.
	pub fn select_task(&self, task: TaskSummary) {
		self.selected_task.set(Some(task));
	}

	/// Read the handed-over task once; later reads see nothing.
	pub fn take_selected_task(&self) -> Option<TaskSummary> {
		let mut taken = None;
		self.selected_task.update(|slot| taken = slot.take());
		taken
	}

	/// Forget the previous crawl so nothing keyed on its task id survives a resubmit.
	pub fn begin_scrape(&self) {
		self.scrape_response.set(None);
	}

	pub fn clear_search(&self) {
		self.search_query.set(String::new());
		self.search_response.set(None);
		self.has_searched.set(false);
	}

	/// Drop a stored search that belongs to another index.
	pub fn enter_search(&self, index_id: &str) {
		if self.search_index.get_untracked().as_deref() != Some(index_id) {
			self.clear_search();
			self.search_index.set(Some(index_id.to_string()));
		}
	}
}

impl Default for Session {
	fn default() -> Self {
		Self::new()
	}
}

pub fn provide_session() -> Session {
	let session = Session::new();
	provide_context(session);
	session
}

pub fn use_session() -> Session {
	use_context::<Session>().unwrap_or_else(|| {
		warn!("session: no session in context, starting an empty one");
		provide_session()
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn summary(id: &str) -> TaskSummary {
		TaskSummary {
			task_id: id.into(),
			..TaskSummary::default()
		}
	}

	#[test]
	fn selected_task_is_read_once() {
		let session = Session::new();
		session.select_task(summary("t1"));
		assert_eq!(session.take_selected_task().map(|t| t.task_id), Some("t1".into()));
		assert!(session.take_selected_task().is_none());
	}

	#[test]
	fn new_scrape_forgets_previous_task() {
		let session = Session::new();
		session.scrape_url.set("https://example.com".into());
		session.scrape_response.set(Some(ScrapeResponse {
			task_id: "old".into(),
			..ScrapeResponse::default()
		}));

		session.begin_scrape();
		assert!(session.scrape_response.get_untracked().is_none());
		assert_eq!(session.scrape_url.get_untracked(), "https://example.com");
	}

	#[test]
	fn search_for_other_index_is_dropped() {
		let session = Session::new();
		session.enter_search("idx1");
		session.search_query.set("foo".into());
		session.has_searched.set(true);

		session.enter_search("idx1");
		assert_eq!(session.search_query.get_untracked(), "foo");

		session.enter_search("idx2");
		assert_eq!(session.search_query.get_untracked(), "");
		assert!(!session.has_searched.get_untracked());
	}
}
