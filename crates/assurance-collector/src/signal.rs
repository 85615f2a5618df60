use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// 取消采集任务组的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 系统信号（SIGTERM / SIGINT / CTRL_C）
    Signal(&'static str),
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Signal(name) => write!(f, "received {}", name),
            StopReason::Requested => f.write_str("stop requested"),
        }
    }
}

/// 采集任务组的停止开关
///
/// 克隆后共享同一状态；只保留第一次停止的原因
#[derive(Clone)]
pub struct StopSwitch {
    state: Arc<watch::Sender<Option<StopReason>>>,
}

impl StopSwitch {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn stop(&self, reason: StopReason) {
        self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.state.borrow()
    }

    /// 等待停止；已经停止时立即返回
    pub async fn stopped(&self) -> StopReason {
        let mut changes = self.state.subscribe();
        loop {
            if let Some(reason) = *changes.borrow_and_update() {
                return reason;
            }
            // 自身持有发送端，通道不会关闭
            if changes.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for StopSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// 等待 SIGTERM / SIGINT
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<StopReason> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    };
    info!(signal = name, "Received shutdown signal");
    Ok(StopReason::Signal(name))
}

#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<StopReason> {
    tokio::signal::ctrl_c().await?;
    info!(signal = "CTRL_C", "Received shutdown signal");
    Ok(StopReason::Signal("CTRL_C"))
}
