//! 告警关联引擎
//!
//! 按 `(node_name, alert_type)` 关联历史记录，决定事件起始时间、
//! 是否发布到消息总线，并把最终消息归档到按月分区的索引。

pub mod engine;

pub use engine::{AlertEngine, AlertIndices};
