//! 仿真器
//!
//! 单线程事件驱动调度：每个事件执行完毕后才取下一个，会话状态因此只有一个写者。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 自创建以来已执行的事件总数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 调度事件在指定时间执行；早于当前时间的请求按当前时间处理。
    #[tracing::instrument(level = "trace", skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = %at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let seq = self.next_seq;
        let at = at.max(self.now);
        trace!(now = %self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 在 `now + delay` 调度事件
    pub fn schedule_in<E: Event>(&mut self, delay: SimTime, ev: E) {
        let at = self.now.after(delay);
        self.schedule(at, ev);
    }

    /// 丢弃所有尚未执行的事件（整体拆除一次仿真时使用）。
    pub fn clear(&mut self) {
        debug!(dropped = self.q.len(), "清空事件队列");
        self.q.clear();
    }

    /// 执行队首事件；队列为空时返回 false。
    fn step(&mut self, world: &mut dyn World) -> bool {
        let Some(item) = self.q.pop() else {
            return false;
        };
        self.now = item.at;
        self.executed = self.executed.saturating_add(1);
        trace!(now = %self.now, seq = item.seq, remaining_queue = self.q.len(), "执行事件");
        item.ev.execute(self, world);
        world.on_tick(self);
        true
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            self.step(world);
        }
        self.now = self.now.max(until);
    }

    /// 最多执行 `max_events` 个事件，返回实际执行的数量。
    pub fn run_events(&mut self, max_events: u64, world: &mut dyn World) -> u64 {
        let mut n = 0;
        while n < max_events && self.step(world) {
            n += 1;
        }
        n
    }

    /// 运行所有事件直到队列为空。
    ///
    /// 注意：无上限重传的会话在 100% 丢包下永远不会清空队列，
    /// 这种场景应改用 [`Simulator::run_until`] 或 [`Simulator::run_events`]。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        let start = self.executed;
        while self.step(world) {}
        info!(
            total_events = self.executed - start,
            final_time = %self.now,
            "✅ 仿真完成"
        );
    }
}
