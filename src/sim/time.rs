//! 仿真时间类型
//!
//! 以毫秒为基本刻度：发包节拍、思考时间、重传退避都按毫秒配置。

use serde::{Deserialize, Serialize};

/// 仿真时间（毫秒）。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize,
)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms)
    }

    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000))
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// `self + d`，溢出时饱和。
    pub fn after(self, d: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(d.0))
    }

    /// `self + d * n`，溢出时饱和。
    pub fn after_n(self, d: SimTime, n: u64) -> SimTime {
        SimTime(self.0.saturating_add(d.0.saturating_mul(n)))
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
