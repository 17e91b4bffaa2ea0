//! Reusable view components.

pub mod force_graph;
mod header;
mod notice;

pub use header::Header;
pub use notice::NoticeBanner;
