//! NATS 消息总线
//!
//! 告警消息发布到配置的 subject，每次发布都等待服务器确认（flush），
//! 等待时间受 `bus.timeout` 限制。

pub mod bus;

pub use bus::{parse_servers, DisabledBus, NatsBus, NatsConnector};
