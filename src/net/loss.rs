//! 逐跳丢包模型
//!
//! 每经过一跳抽取一个 [0, 100) 的均匀整数，小于错误率（百分比）即在该跳的终点丢失。
//! 每跳、每个包（包括重传）独立抽取，不记忆历史。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 丢包模型
#[derive(Debug, Clone)]
pub struct LossModel {
    error_rate: u32,
    rng: ChaCha8Rng,
}

impl LossModel {
    /// `error_rate` 为百分比，超过 100 按 100 处理
    pub fn new(error_rate: u32, seed: u64) -> Self {
        Self {
            error_rate: error_rate.min(100),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn error_rate(&self) -> u32 {
        self.error_rate
    }

    /// 抽取一跳：true 表示丢失
    pub fn hop_lost(&mut self) -> bool {
        let draw: u32 = self.rng.gen_range(0..100);
        draw < self.error_rate
    }
}
