// src/config/mod.rs

//! Configuration for devloop.
//!
//! Responsibilities:
//! - Define the optional TOML-backed data model (`model.rs`).
//! - Load the config file from disk when present (`loader.rs`).
//! - Merge CLI flags, file values and defaults into [`Settings`] (`settings.rs`).
//! - Validate the merged settings (`validate.rs`).
//! - Read `.env` variables handed to the application (`dotenv.rs`).

pub mod dotenv;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use dotenv::{load_dotenv, parse_dotenv};
pub use loader::{load_from_path, load_optional, DEFAULT_CONFIG_FILE};
pub use model::{BuildSection, ConfigFile, NotifySection, ProxySection, RunSection, WatchSection};
pub use settings::{split_list, Settings};
pub use validate::validate_settings;
