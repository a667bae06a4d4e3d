use std::fs;
use std::process;

use jmdex_core::settings::{self, Settings};

/// Unwrap `$result` or print the message (with the error as its last
/// argument) and exit with status 1.
macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}

pub mod build_ops;
pub mod config_ops;
pub mod example_ops;
pub mod query_ops;

/// The settings in `config`, or the embedded defaults.
fn load_settings(config: Option<&str>) -> Settings {
    let Some(file) = config else {
        return Settings::defaults();
    };
    let content = fs::read_to_string(file).unwrap_or_else(|e| {
        eprintln!("Error reading {file}: {e}");
        process::exit(1);
    });
    die!(settings::parse_settings_toml(&content), "Error in {file}: {}")
}
