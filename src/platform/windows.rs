// AstroLab platform paths for Windows
// Config and data: %APPDATA%/AstroLab

use std::path::PathBuf;

fn roaming(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    let appdata = lookup("APPDATA")
        .unwrap_or_else(|| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("AstroLab")
}

pub fn config_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    roaming(lookup)
}

pub fn data_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    roaming(lookup)
}
