pub mod admin;
pub mod build;
pub mod knowledge_base;
pub mod not_found;
pub mod scrape;
pub mod search;
pub mod view_index;
