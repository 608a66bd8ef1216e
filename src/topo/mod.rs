//! 拓扑构建器

pub mod chain;
pub mod regions;
