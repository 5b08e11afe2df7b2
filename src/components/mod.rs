pub mod cluster_browser;
pub mod force_graph;
pub mod layout;
pub mod log_viewer;
pub mod search_panel;
pub mod task_details;
pub mod task_table;
