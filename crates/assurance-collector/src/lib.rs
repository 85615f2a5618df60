pub mod adapter;
pub mod bootstrap;
pub mod config;
pub mod launcher;
pub mod node;
pub mod runtime;
pub mod signal;

pub use adapter::{CustomerQuery, DeviceAdapter, Service, Snapshot};
pub use bootstrap::{run_until_signal, Connectors};
pub use config::{BaseConfig, FailurePolicy};
pub use launcher::Launcher;
pub use node::{resolve_node_name, NodeIdentity};
pub use runtime::{CollectorRuntime, CollectorSettings};
pub use signal::{wait_for_signal, StopReason, StopSwitch};
