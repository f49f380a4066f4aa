// AstroLab platform paths for Linux
// Config: $XDG_CONFIG_HOME/astrolab or ~/.config/astrolab
// Data:   $XDG_DATA_HOME/astrolab  or ~/.local/share/astrolab

use std::path::PathBuf;

fn home(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(lookup("HOME").unwrap_or_else(|| String::from("/tmp")))
}

pub fn config_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    match lookup("XDG_CONFIG_HOME") {
        Some(xdg) => PathBuf::from(xdg).join("astrolab"),
        None => home(lookup).join(".config").join("astrolab"),
    }
}

pub fn data_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    match lookup("XDG_DATA_HOME") {
        Some(xdg) => PathBuf::from(xdg).join("astrolab"),
        None => home(lookup).join(".local").join("share").join("astrolab"),
    }
}
