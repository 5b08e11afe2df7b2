mod channel;
mod component;
mod queue;
mod record;

pub use component::LogViewer;
