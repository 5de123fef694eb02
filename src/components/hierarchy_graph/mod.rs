//! Collapsible class/ownership hierarchy laid out with force-directed physics.

mod component;
mod config;
mod error;
mod geometry;
mod layout;
mod loader;
mod model;
mod render;
mod session;
mod state;
mod types;
mod visibility;

pub use component::HierarchyGraphCanvas;
pub use config::GraphConfig;
pub use loader::load_graph;
pub use model::GraphModel;
