pub mod env_file;
pub mod error;
pub mod loader;
pub mod placeholder;

pub use env_file::{load_dotenv, load_dotenv_from};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, CONFIG_DIR_ENV, ENV_PREFIX};
pub use placeholder::expand_placeholders;
