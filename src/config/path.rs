//! Module for locating hidmap config and data files

use std::path::PathBuf;

/// Prefix used for the XDG base directories
const XDG_PREFIX: &str = "hidmap";
/// Name of the decoder configuration file
pub const DECODER_CONFIG_FILE: &str = "decoder.yaml";
/// Name of the persisted layout
pub const LAYOUT_FILE: &str = "mapping.json";
/// Name of the accumulated sample pairs
pub const SAMPLES_FILE: &str = "mapping.samples.json";
/// Prefix of layouts that failed validation
pub const FAILED_PREFIX: &str = "mapping.failed";

/// Returns the directory where layouts and samples are stored. Uses the XDG
/// data home (e.g. "~/.local/share/hidmap") and falls back to the current
/// directory.
pub fn get_data_path() -> PathBuf {
    let Ok(base_dirs) = xdg::BaseDirectories::with_prefix(XDG_PREFIX) else {
        log::warn!("Unable to determine data path. Using current directory.");
        return PathBuf::from(".");
    };
    base_dirs.get_data_home()
}

/// Returns a list of candidate decoder config files in load order.
/// E.g. ["./decoder.yaml", "~/.config/hidmap/decoder.yaml", "/etc/hidmap/decoder.yaml"]
pub fn get_decoder_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".").join(DECODER_CONFIG_FILE)];
    if let Ok(base_dirs) = xdg::BaseDirectories::with_prefix(XDG_PREFIX) {
        paths.push(base_dirs.get_config_home().join(DECODER_CONFIG_FILE));
    }
    paths.push(PathBuf::from("/etc/hidmap").join(DECODER_CONFIG_FILE));

    paths
}

/// Returns the first decoder config file that exists
pub fn find_decoder_config() -> Option<PathBuf> {
    get_decoder_config_paths().into_iter().find(|path| {
        log::trace!("Checking {path:?} for decoder config");
        path.is_file()
    })
}
