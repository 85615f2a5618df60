//! F5 BIG-IP 采集器
//!
//! 通过 iControl REST 读取系统信息和集群设备列表，
//! 对每台设备评估设备状态、HA 状态和资源使用率。

pub mod adapter;
pub mod rules;
pub mod session;
pub mod types;

pub use adapter::F5Adapter;
pub use session::F5BigIPSession;
pub use types::{F5BigIP, F5BigIPDevice, F5BigIPStatus, F5Config};
