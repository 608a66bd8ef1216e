//! 传输仿真世界
//!
//! 持有会话表与事件日志；调度事件通过句柄访问会话。

use std::any::Any;
use tracing::trace;

use super::session::{Session, SessionArena, SessionHandle};
use crate::report::EventLog;
use crate::sim::World;

/// 默认的传输世界实现
#[derive(Debug, Default)]
pub struct TransferWorld {
    pub sessions: SessionArena,
    pub log: EventLog,
}

impl TransferWorld {
    /// 拆除所有会话并清空日志
    pub fn reset(&mut self) {
        self.sessions.clear();
        self.log.clear();
    }
}

impl World for TransferWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 找到仍在运行的会话并执行 `f`；世界类型不符、会话已拆除或已结束时为空操作。
pub(crate) fn with_session<F>(world: &mut dyn World, handle: SessionHandle, f: F)
where
    F: FnOnce(&mut Session, &mut EventLog),
{
    let Some(w) = world.as_any_mut().downcast_mut::<TransferWorld>() else {
        trace!(session = %handle, "world is not TransferWorld, ignoring event");
        return;
    };
    let TransferWorld { sessions, log } = w;
    match sessions.get_mut(handle) {
        Some(s) if s.is_running() => f(s, log),
        Some(_) => trace!(session = %handle, "会话已结束，忽略延迟事件"),
        None => trace!(session = %handle, "会话已拆除，忽略延迟事件"),
    }
}
