//! FortiManager 采集器
//!
//! 通过 JSON-RPC 读取 FortiManager 状态和受管设备列表，
//! 对每台设备评估连接状态和 HA 集群状态。

pub mod adapter;
pub mod rules;
pub mod session;
pub mod types;

pub use adapter::FortinetAdapter;
pub use session::FortiManagerSession;
pub use types::{FortiConfig, FortiManager, FortiManagerStatus, FortinetDevice, HaRole, HaSlave};
