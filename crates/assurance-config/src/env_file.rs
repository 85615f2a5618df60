use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// 读取当前目录（或上级目录）中的 `.env`
///
/// 必须在解析命令行和读取配置之前调用；已存在的环境变量不会被覆盖
pub fn load_dotenv() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// 读取指定的 env 文件，规则同 [`load_dotenv`]
pub fn load_dotenv_from<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    dotenv::from_path(path).map_err(|e| ConfigError::Dotenv {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
