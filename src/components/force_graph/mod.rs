//! Canvas renderer for association graphs, driven by the `force_graph`
//! simulation.

mod component;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
