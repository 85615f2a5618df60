use assurance_core::{AssuranceError, Result};
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::adapter::DeviceAdapter;
use crate::config::FailurePolicy;
use crate::runtime::CollectorRuntime;
use crate::signal::StopSwitch;

/// 采集任务组
///
/// 每个配置的设备一个任务，全部并发运行；失败处理见 [`FailurePolicy`]。
/// 停止开关触发时取消全部任务。
pub struct Launcher {
    policy: FailurePolicy,
    tasks: JoinSet<(String, Result<()>)>,
    total: usize,
}

impl Launcher {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            tasks: JoinSet::new(),
            total: 0,
        }
    }

    pub fn spawn<F>(&mut self, name: impl Into<String>, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        debug!(collector = %name, "Collector task spawned");
        self.total += 1;
        self.tasks.spawn(async move { (name, task.await) });
    }

    pub fn spawn_runtime<A: DeviceAdapter>(&mut self, runtime: CollectorRuntime<A>) {
        let name = runtime.name().to_string();
        self.spawn(name, async move { runtime.run().await });
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// 等待所有任务结束
    pub async fn run(mut self, stop: StopSwitch) -> Result<()> {
        let mut first_error: Option<AssuranceError> = None;
        let mut failed: Vec<String> = Vec::new();
        let mut listening = true;

        loop {
            tokio::select! {
                joined = self.tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let (name, result) = match joined {
                        Ok(finished) => finished,
                        Err(e) if e.is_cancelled() => {
                            debug!("Collector task cancelled");
                            continue;
                        }
                        Err(e) => (
                            "unknown".to_string(),
                            Err(AssuranceError::Task(format!("collector task panicked: {}", e))),
                        ),
                    };

                    match result {
                        Ok(()) => info!(collector = %name, "Collector finished"),
                        Err(e) => {
                            error!(collector = %name, error = %e, "Collector failed");
                            if self.policy == FailurePolicy::FailTogether && first_error.is_none() {
                                warn!(collector = %name, "Cancelling remaining collectors");
                                self.tasks.abort_all();
                            }
                            failed.push(name);
                            first_error.get_or_insert(e);
                        }
                    }
                }
                reason = stop.stopped(), if listening => {
                    warn!(reason = %reason, "Shutdown requested, cancelling collectors");
                    listening = false;
                    self.tasks.abort_all();
                    first_error.get_or_insert(AssuranceError::Cancelled(reason.to_string()));
                }
            }
        }

        match (self.policy, first_error) {
            (_, None) => {
                info!(collectors = self.total, "All collectors finished");
                Ok(())
            }
            (FailurePolicy::FailTogether, Some(e)) => Err(e),
            (FailurePolicy::Isolate, Some(e)) if failed.is_empty() => Err(e),
            (FailurePolicy::Isolate, Some(_)) => Err(AssuranceError::Task(format!(
                "{} of {} collectors failed: {}",
                failed.len(),
                self.total,
                failed.join(", ")
            ))),
        }
    }
}
