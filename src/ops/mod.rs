pub mod actions;
pub mod activity_ops;
pub mod heatmap;
pub mod stats;
pub mod streak;
pub mod task_ops;
