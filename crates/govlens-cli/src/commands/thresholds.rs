//! Thresholds command implementation

use std::path::Path;

use anyhow::Result;
use govlens_core::config::default_config_path;
use govlens_core::Thresholds;

pub fn cmd_thresholds(thresholds: &Thresholds, override_path: Option<&Path>) -> Result<()> {
    match override_path {
        Some(path) => println!("# Source: {}", path.display()),
        None => match default_config_path() {
            Some(path) if path.exists() => println!("# Source: {}", path.display()),
            Some(path) => println!("# Source: built-in defaults (override at {})", path.display()),
            None => println!("# Source: built-in defaults"),
        },
    }
    print!("{}", thresholds.to_toml()?);
    Ok(())
}
