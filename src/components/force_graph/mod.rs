mod component;
mod engine;
mod prepare;
mod presets;
mod render;
mod state;
mod types;

pub use component::NetworkGraph;
pub use types::GraphPayload;
