pub mod config;

pub use config::{load_list_config, ListConfig, ListConfigFile};
