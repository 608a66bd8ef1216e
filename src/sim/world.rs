//! 世界 trait
//!
//! 事件通过 `as_any_mut` 拿到具体的世界类型（会话表、随机数源、事件日志）。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
