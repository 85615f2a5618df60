use assurance_types::validate;
use config::{Config, File, FileFormat};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::placeholder::expand_placeholders;

/// 配置目录环境变量
pub const CONFIG_DIR_ENV: &str = "ASSURANCE_CONFIG_DIR";

/// 可在配置文件中引用的环境变量前缀
pub const ENV_PREFIX: &str = "ASSURANCE_";

/// 配置加载器
///
/// 读取目录下所有 `*.yaml`（按文件名排序），替换占位符后依次合并，
/// 后读取的文件覆盖先读取的同名键。合并结果额外包含 `config_dir`。
pub struct ConfigLoader {
    config_dir: PathBuf,
    vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// 使用给定目录，占位符取自当前进程的 `ASSURANCE_*` 环境变量
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        let vars = std::env::vars()
            .filter(|(name, _)| name.starts_with(ENV_PREFIX))
            .collect();
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            vars,
        }
    }

    /// 从 `ASSURANCE_CONFIG_DIR` 读取目录，目录不存在或不是目录时失败
    pub fn from_env() -> Result<Self> {
        let dir = std::env::var_os(CONFIG_DIR_ENV).ok_or(ConfigError::MissingDir(CONFIG_DIR_ENV))?;
        let loader = Self::new(dir);
        loader.check_dir()?;
        Ok(loader)
    }

    /// 替换占位符变量表
    pub fn with_vars<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.vars = vars.into_iter().collect();
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn check_dir(&self) -> Result<()> {
        if !self.config_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                env: CONFIG_DIR_ENV,
                path: self.config_dir.clone(),
            });
        }
        Ok(())
    }

    /// 目录下的 yaml 文件（按文件名排序）
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        self.check_dir()?;
        let entries = fs::read_dir(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: self.config_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "yaml") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// 合并后的配置树
    pub fn load_value(&self) -> Result<Value> {
        let mut builder = Config::builder();

        for path in self.files()? {
            debug!(file = %path.display(), "Reading config file");
            let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let expanded = expand_placeholders(&raw, &self.vars)
                .map_err(|message| ConfigError::Placeholder { path: path.clone(), message })?;
            builder = builder.add_source(File::from_str(&expanded, FileFormat::Yaml));
        }

        let config_dir = self.config_dir.to_string_lossy().into_owned();
        let merged = builder.set_override("config_dir", config_dir)?.build()?;
        Ok(merged.try_deserialize::<Value>()?)
    }

    /// 加载为类型化配置，结构不符时返回带原始输入的校验错误
    pub fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.load_value()?;
        Ok(validate("config", &value)?)
    }
}
