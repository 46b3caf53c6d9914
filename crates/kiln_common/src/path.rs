//! Path helpers shared by the loader and the hasher.

use std::path::{Component, Path, PathBuf};

/// Returns `path` expressed relative to `base`, walking up with `..` as needed.
///
/// Both paths are expected to be absolute. Hash inputs use this form so a
/// checkout in a different directory produces the same fingerprint.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path_components: Vec<Component<'_>> = path.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }
    relative
}
