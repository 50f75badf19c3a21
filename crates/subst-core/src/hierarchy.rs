//! Ancestor chain and directory depth

use std::path::{Component, Path, PathBuf};

/// Directories from `root` upward, `root` first
///
/// Stops at the filesystem root (which is not included, matching how overlays
/// never live there) or at a relative path that runs out of parents. Every step
/// strictly shortens the path, so the walk always terminates.
pub fn ancestors(root: &Path) -> Vec<PathBuf> {
    let mut chain = Vec::new();
    let mut current = root.to_path_buf();

    loop {
        chain.push(current.clone());

        let Some(parent) = current.parent() else {
            break;
        };
        if parent == current || is_boundary(parent) {
            break;
        }
        current = parent.to_path_buf();
    }

    chain
}

/// Ordering key: number of normal components below the filesystem root
pub fn depth(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

/// Sort shallow first, ties broken by lexical path order
pub fn sort_by_depth(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));
}

fn is_boundary(path: &Path) -> bool {
    path.as_os_str().is_empty()
        || path == Path::new(".")
        || path.parent().is_none()
}
