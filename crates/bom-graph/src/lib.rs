//! # BOM Graph
//!
//! BOM 圖：批次載入、循環偵測與層數防護

pub mod arena;
pub mod graph;

// Re-export 主要類型
pub use arena::{BomArena, BomEdge, BomNode, NodeIndex};
pub use graph::BomGraph;
