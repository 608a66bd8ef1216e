//! 会话事件与结果记录
//!
//! 设计目标：
//! - **结构化**：日志、结果表都从同一条有序事件流导出，而不是解析文本
//! - **可回放**：事件带仿真时间戳（毫秒），可直接写成 JSON 供外部渲染

mod types;

pub use types::{EventLog, ResultRow, RouteRow, SessionEvent, SessionEventKind};
