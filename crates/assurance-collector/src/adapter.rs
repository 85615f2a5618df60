use assurance_core::Result;
use assurance_types::{Alert, Customer, KeepAliveAlert};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 一次采集的结果：管理系统状态和设备列表
#[derive(Debug, Clone)]
pub struct Snapshot<S, D> {
    pub status: S,
    pub devices: Vec<D>,
}

impl<S, D> Snapshot<S, D> {
    pub fn new(status: S, devices: Vec<D>) -> Self {
        Self { status, devices }
    }
}

/// 客户查询条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerQuery {
    pub uuid: Option<String>,
    pub hostname: Option<String>,
}

/// 单个设备的服务文档（状态 + 设备 + 客户），归档到数据索引并作为规则函数输入
#[derive(Debug, Serialize)]
pub struct Service<'a, S, D> {
    pub timestamp: DateTime<Utc>,
    pub status: &'a S,
    pub device: &'a D,
    pub customer: Option<Customer>,
}

impl<'a, S, D> Service<'a, S, D> {
    pub fn new(status: &'a S, device: &'a D, customer: Option<Customer>) -> Self {
        Self {
            timestamp: Utc::now(),
            status,
            device,
            customer,
        }
    }
}

/// 厂商适配器
///
/// `evaluate` 是纯函数：不做 I/O，对同一厂商总是按相同顺序返回相同数量的
/// alert_type（不产生告警的位置为 `None`），保证事件流标识跨周期稳定。
#[async_trait]
pub trait DeviceAdapter: Send + Sync + 'static {
    type Status: Serialize + Send + Sync;
    type Device: Serialize + Send + Sync;

    /// 采集任务名称（配置中的设备/管理器名称）
    fn name(&self) -> &str;

    /// 采集器自身的心跳
    fn keepalive(&self) -> KeepAliveAlert;

    /// 调用管理接口，每次运行调用一次
    async fn collect(&self) -> Result<Snapshot<Self::Status, Self::Device>>;

    fn customer_query(&self, device: &Self::Device) -> CustomerQuery;

    /// 规则函数
    fn evaluate(&self, service: &Service<'_, Self::Status, Self::Device>) -> Result<Vec<Option<Alert>>>;

    /// 发送前覆盖告警的长描述
    fn summary(&self, _alert: &Alert) -> Option<String> {
        None
    }
}
