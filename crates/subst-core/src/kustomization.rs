//! Kustomization structure discovery
//!
//! Finds every directory carrying a kustomization file and resolves which
//! resource directories are *active*, i.e. still listed in the root
//! kustomization's `resources` field. Entries that were commented out or
//! removed never show up here, which is what keeps inactive overlays from
//! contributing substitution values.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};

/// Accepted kustomization file names, checked in this order
pub const KUSTOMIZATION_FILE_NAMES: [&str; 3] =
    ["kustomization.yaml", "kustomization.yml", "Kustomization"];

/// The parts of a kustomization file we care about
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestList {
    #[serde(default)]
    pub resources: Vec<String>,
}

impl ManifestList {
    /// Parse a kustomization file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| CoreError::yaml(path, e))
    }
}

/// Result of scanning a root directory
#[derive(Debug, Clone, Default)]
pub struct KustomizeStructure {
    /// Root the scan started from
    pub root: PathBuf,

    /// Every directory under the root holding a kustomization file
    pub manifest_dirs: BTreeSet<PathBuf>,

    /// Resource directories declared by the root kustomization that exist
    pub resource_paths: Vec<PathBuf>,
}

impl KustomizeStructure {
    /// Scan `root` for kustomization files and resolve active resources
    pub fn discover(root: &Path) -> Result<Self> {
        let manifest_dirs = find_manifest_dirs(root);
        let resource_paths = match root_manifest_file(root) {
            Some(file) => active_resource_paths(root, &ManifestList::from_file(&file)?),
            None => {
                tracing::debug!(root = %root.display(), "no kustomization file in root");
                Vec::new()
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            manifest_dirs,
            resource_paths,
        })
    }
}

/// Whether a file name is one of the kustomization spellings (case-insensitive)
pub fn is_manifest_file_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    KUSTOMIZATION_FILE_NAMES
        .iter()
        .any(|candidate| candidate.to_lowercase() == lower)
}

/// Locate the kustomization file directly inside `dir`
pub fn root_manifest_file(dir: &Path) -> Option<PathBuf> {
    KUSTOMIZATION_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

fn find_manifest_dirs(root: &Path) -> BTreeSet<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_manifest_file_name(&entry.file_name().to_string_lossy()))
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect()
}

/// Resolve declared resources against `root`, keeping existing directories only
///
/// File resources (plain manifests) and remote references are dropped, as are
/// entries pointing at directories that do not exist.
pub fn active_resource_paths(root: &Path, list: &ManifestList) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();

    for resource in &list.resources {
        let resolved = normalize(&root.join(resource));
        if !resolved.is_dir() {
            tracing::debug!(resource, "resource is not a local directory, ignoring");
            continue;
        }
        if !paths.contains(&resolved) {
            paths.push(resolved);
        }
    }

    paths
}

/// Lexically clean a path, folding `.` and `..` components
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("cluster/apps/redis")).unwrap();
        fs::create_dir_all(root.join("cluster/apps/legacy")).unwrap();
        fs::create_dir_all(root.join("base")).unwrap();
        fs::write(root.join("base/kustomization.yml"), "resources: []\n").unwrap();
        fs::write(root.join("cluster/apps/redis/Kustomization"), "resources: []\n").unwrap();
        fs::write(
            root.join("cluster/kustomization.yaml"),
            r#"apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
resources:
  - apps/redis
  # - apps/legacy
  - ../base
  - missing
  - deployment.yaml
"#,
        )
        .unwrap();
        fs::write(root.join("cluster/deployment.yaml"), "kind: Deployment\n").unwrap();
        dir
    }

    #[test]
    fn test_active_resources_skip_commented_and_missing() {
        let dir = layout();
        let root = dir.path().join("cluster");

        let structure = KustomizeStructure::discover(&root).unwrap();

        assert_eq!(
            structure.resource_paths,
            vec![root.join("apps/redis"), dir.path().join("base")]
        );
    }

    #[test]
    fn test_manifest_dirs_are_found_recursively() {
        let dir = layout();
        let root = dir.path().join("cluster");

        let structure = KustomizeStructure::discover(&root).unwrap();

        assert!(structure.manifest_dirs.contains(&root));
        assert!(structure.manifest_dirs.contains(&root.join("apps/redis")));
        // Outside the root, not scanned
        assert!(!structure.manifest_dirs.contains(&dir.path().join("base")));
    }

    #[test]
    fn test_missing_kustomization_is_not_an_error() {
        let dir = TempDir::new().unwrap();

        let structure = KustomizeStructure::discover(dir.path()).unwrap();

        assert!(structure.resource_paths.is_empty());
        assert!(structure.manifest_dirs.is_empty());
    }

    #[test]
    fn test_file_name_matching_ignores_case() {
        assert!(is_manifest_file_name("kustomization.yaml"));
        assert!(is_manifest_file_name("KUSTOMIZATION.YML"));
        assert!(is_manifest_file_name("kustomization"));
        assert!(!is_manifest_file_name("kustomization.json"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("/a/..")), PathBuf::from("/"));
    }
}
