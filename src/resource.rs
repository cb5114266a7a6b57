//! Locating bundled resources.
//!
//! A packaged install sets `RAINY_BUNDLE_DIR` (or ships an `assets` directory next to the
//! executable); a development checkout runs from the repository root and falls back to the
//! current working directory.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable a packaged launcher sets to the unpacked bundle directory.
pub const BUNDLE_DIR_ENV: &str = "RAINY_BUNDLE_DIR";

/// Directory next to the executable whose presence marks an installed layout.
pub const ASSETS_DIR: &str = "assets";

/// The rain loop, relative to the install base.
pub fn default_sound_path() -> PathBuf {
    Path::new(ASSETS_DIR).join("audio").join("rain.wav")
}

/// Base directory bundled resources are resolved against.
pub fn install_base_dir() -> PathBuf {
    let bundle_dir = env::var_os(BUNDLE_DIR_ENV).map(PathBuf::from);
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    base_dir_from(bundle_dir.as_deref(), exe_dir.as_deref(), &cwd)
}

/// Resolve `relative` against the install base. Absolute paths pass through unchanged.
pub fn resource_path(relative: impl AsRef<Path>) -> PathBuf {
    let relative = relative.as_ref();
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    install_base_dir().join(relative)
}

/// Bundle marker first, then an executable directory carrying `assets`, then `cwd`.
pub fn base_dir_from(bundle_dir: Option<&Path>, exe_dir: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(dir) = bundle_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        return dir.to_path_buf();
    }
    if let Some(dir) = exe_dir.filter(|dir| dir.join(ASSETS_DIR).is_dir()) {
        return dir.to_path_buf();
    }
    cwd.to_path_buf()
}
