use anyhow::Context;
use assurance_collector::{run_until_signal, CollectorRuntime, CollectorSettings, Connectors, Launcher};
use assurance_config::{load_dotenv, ConfigLoader};
use assurance_f5::{F5Adapter, F5Config};
use assurance_logging::{ApiDump, LoggingConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "F5 BIG-IP service assurance collector")]
struct Args {
    /// 配置目录（按文件名顺序合并其中的 *.yaml）
    #[arg(long, env = "ASSURANCE_CONFIG_DIR")]
    config_dir: PathBuf,

    /// 不连接 Elasticsearch 和消息总线
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 需要在解析参数前加载，ASSURANCE_CONFIG_DIR 可以来自其中
    let env_file = load_dotenv();
    let args = Args::parse();

    let logging = LoggingConfig::from_env();
    assurance_logging::init(&logging)?;
    if let Some(path) = &env_file {
        debug!(target: "collector", path = %path.display(), "Loaded environment file");
    }

    let config: F5Config = ConfigLoader::new(&args.config_dir)
        .load()
        .with_context(|| format!("loading configuration from {}", args.config_dir.display()))?;
    info!(
        target: "collector",
        config_dir = %config.base.config_dir.display(),
        devices = config.devices.len(),
        dry_run = args.dry_run,
        "Starting collector-f5"
    );

    let connectors = if args.dry_run {
        Connectors::dry_run()
    } else {
        Connectors::live(&config.base)
    };
    let settings = CollectorSettings::from_base(&config.base, &config.data_index, config.uuid_required);
    let dump = ApiDump::new(logging.api_debug);

    let mut launcher = Launcher::new(config.base.failure_policy);
    for bigip in &config.devices {
        launcher.spawn_runtime(CollectorRuntime::new(
            F5Adapter::new(bigip.clone(), dump),
            settings.clone(),
            connectors.storage.clone(),
            connectors.bus.clone(),
        ));
    }

    if let Err(e) = run_until_signal(launcher).await {
        error!(target: "collector", error = %e, "collector-f5 failed");
        return Err(e.into());
    }
    info!(target: "collector", "collector-f5 finished");
    Ok(())
}
