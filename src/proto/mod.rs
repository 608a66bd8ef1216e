//! 传输协议模块
//!
//! 分片计划、派生指标扫描、会话状态机（虚电路 / 数据报）以及发起传输的入口。

pub mod plan;
mod session;
pub mod sweep;
mod transfer;
mod world;

pub use plan::{HEADER_SIZE, TransmissionMode, TransmissionPlan};
pub use session::{
    Phase, RetryPolicy, Session, SessionArena, SessionConfig, SessionHandle, SessionRequest,
    SessionStatus,
};
pub use transfer::{TransferReport, TransferRequest, run_transfer, start_session, start_transfer};
pub use world::TransferWorld;
