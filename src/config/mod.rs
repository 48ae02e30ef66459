//! Configuration module for datecrawl
//!
//! A crawl is configured in two layers: a user-supplied JSON file and a
//! TOML file of named defaults. [`resolve`] merges the two (user values win)
//! into an immutable [`CrawlConfig`].
//!
//! # Example
//!
//! ```no_run
//! use datecrawl::config::{load_config, resolve, PartialConfig};
//! use std::path::Path;
//!
//! let user = load_config(Path::new("crawl.json")).unwrap();
//! let config = resolve(&PartialConfig::default(), &user).unwrap();
//! println!("Crawler will use {} connections", config.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlConfig, PartialConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_defaults, DEFAULTS_PATH,
};
pub use validation::{parse_date, require_date, resolve};
