//! Loading of `subst.yaml` override files along the overlay hierarchy

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::hierarchy;
use crate::report::{ResolutionReport, SourceKind};
use crate::values::Values;

/// Name of the per-directory override file
pub const OVERRIDE_FILE_NAME: &str = "subst.yaml";

/// Merges override files from ancestors and active resource directories
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideLoader {
    strict: bool,
}

impl OverrideLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on unreadable or malformed override files instead of skipping them
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Directories that may contribute, shallowest first
    ///
    /// The union of the ancestor chain of `root` and the active resource
    /// paths, deduplicated and ordered by depth then path.
    pub fn eligible_dirs(root: &Path, resource_paths: &[PathBuf]) -> Vec<PathBuf> {
        let unique: BTreeSet<PathBuf> = hierarchy::ancestors(root)
            .into_iter()
            .chain(resource_paths.iter().cloned())
            .collect();

        let mut dirs: Vec<PathBuf> = unique.into_iter().collect();
        hierarchy::sort_by_depth(&mut dirs);
        dirs
    }

    /// Load and deep merge every override file, deeper directories winning
    pub fn load(
        &self,
        root: &Path,
        resource_paths: &[PathBuf],
        report: &mut ResolutionReport,
    ) -> Result<Values> {
        let mut merged = Values::new();

        for dir in Self::eligible_dirs(root, resource_paths) {
            let path = dir.join(OVERRIDE_FILE_NAME);
            if !path.is_file() {
                tracing::trace!(dir = %dir.display(), "no override file");
                continue;
            }

            match Values::from_file(&path) {
                Ok(values) => {
                    tracing::debug!(path = %path.display(), keys = values.len(), "merging override file");
                    merged.merge(&values);
                }
                Err(e) if self.strict => return Err(e),
                Err(e) => report.skip(SourceKind::Override, &path, e),
            }
        }

        Ok(merged)
    }
}

/// Whether any override file exists under `dir`, at any depth
pub fn contains_override_file(dir: &Path) -> bool {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|entry| entry.file_type().is_file() && entry.file_name() == OVERRIDE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(OVERRIDE_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_deeper_directory_wins() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("clusters");
        let root = parent.join("prod");
        write(&parent, "env: base\nimage:\n  tag: v1\n  repo: nginx\n");
        write(&root, "env: prod\nreplicas: 3\nimage:\n  tag: v2\n");

        let mut report = ResolutionReport::new();
        let values = OverrideLoader::new().load(&root, &[], &mut report).unwrap();

        assert_eq!(values.get("env").unwrap(), "prod");
        assert_eq!(values.get("replicas").unwrap(), 3);
        assert_eq!(values.get("image.tag").unwrap(), "v2");
        assert_eq!(values.get("image.repo").unwrap(), "nginx");
        assert!(report.is_clean());
    }

    #[test]
    fn test_resource_dirs_override_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cluster");
        let app = root.join("apps/redis");
        write(&root, "redis:\n  replicas: 1\n  memory: 1Gi\n");
        write(&app, "redis:\n  replicas: 2\n");

        let mut report = ResolutionReport::new();
        let values = OverrideLoader::new()
            .load(&root, &[app.clone()], &mut report)
            .unwrap();

        assert_eq!(values.get("redis.replicas").unwrap(), 2);
        assert_eq!(values.get("redis.memory").unwrap(), "1Gi");
    }

    #[test]
    fn test_inactive_directory_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cluster");
        write(&root, "feature: off\n");
        write(&root.join("apps/legacy"), "feature: on\n");

        let mut report = ResolutionReport::new();
        let values = OverrideLoader::new().load(&root, &[], &mut report).unwrap();

        assert_eq!(values.get("feature").unwrap(), "off");
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("clusters");
        let root = parent.join("prod");
        write(&parent, "env: base\n");
        write(&root, "env: [unclosed\n");

        let mut report = ResolutionReport::new();
        let values = OverrideLoader::new().load(&root, &[], &mut report).unwrap();

        assert_eq!(values.get("env").unwrap(), "base");
        assert_eq!(report.skipped_of(SourceKind::Override).count(), 1);
        assert_eq!(report.skipped[0].path, root.join(OVERRIDE_FILE_NAME));
    }

    #[test]
    fn test_strict_mode_fails_on_malformed_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("prod");
        write(&root, "- not\n- a mapping\n");

        let mut report = ResolutionReport::new();
        let err = OverrideLoader::new()
            .strict(true)
            .load(&root, &[], &mut report)
            .unwrap_err();

        assert!(matches!(err, CoreError::NotAMapping { .. }));
    }

    #[test]
    fn test_contains_override_file() {
        let tmp = TempDir::new().unwrap();
        assert!(!contains_override_file(tmp.path()));

        write(&tmp.path().join("apps/web/overlays"), "a: 1\n");
        assert!(contains_override_file(tmp.path()));
    }

    #[test]
    fn test_eligible_dirs_deduplicate_and_sort() {
        let root = PathBuf::from("/r/cluster");
        let resources = vec![
            PathBuf::from("/r/cluster/apps/b"),
            PathBuf::from("/r/cluster"),
            PathBuf::from("/r/cluster/apps/a"),
        ];

        let dirs = OverrideLoader::eligible_dirs(&root, &resources);

        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/r"),
                PathBuf::from("/r/cluster"),
                PathBuf::from("/r/cluster/apps/a"),
                PathBuf::from("/r/cluster/apps/b"),
            ]
        );
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cluster");
        write(&root.join("a"), "shared: a\n");
        write(&root.join("b"), "shared: b\n");
        let resources = vec![root.join("b"), root.join("a")];
        let reversed: Vec<PathBuf> = resources.iter().rev().cloned().collect();

        let mut report = ResolutionReport::new();
        let first = OverrideLoader::new().load(&root, &resources, &mut report).unwrap();
        let second = OverrideLoader::new().load(&root, &reversed, &mut report).unwrap();

        assert_eq!(first, second);
        // Siblings at equal depth merge in lexical order
        assert_eq!(first.get("shared").unwrap(), "b");
    }
}
