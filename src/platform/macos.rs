// AstroLab platform paths for macOS
// Config and data: ~/Library/Application Support/AstroLab

use std::path::PathBuf;

fn app_support(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(lookup("HOME").unwrap_or_else(|| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join("AstroLab")
}

pub fn config_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    app_support(lookup)
}

pub fn data_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    app_support(lookup)
}
