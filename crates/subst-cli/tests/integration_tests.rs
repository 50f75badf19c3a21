//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Helper to run the subst binary
fn subst(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_subst"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute subst")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// An overlay with a root override and one active resource
fn create_overlay() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(root.join("kustomization.yaml"), "resources:\n  - app\n").unwrap();
    fs::write(root.join("subst.yaml"), "name: web\nreplicas: 1\n").unwrap();
    fs::create_dir(root.join("app")).unwrap();
    fs::write(root.join("app/kustomization.yaml"), "resources:\n  - deployment.yaml\n").unwrap();
    fs::write(root.join("app/subst.yaml"), "replicas: 3\n").unwrap();

    dir
}

mod version_command {
    use super::*;

    #[test]
    fn test_version_prints_crate_version() {
        let output = subst(&["version"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_version_flag() {
        let output = subst(&["--version"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    }
}

mod discover_command {
    use super::*;

    #[test]
    fn test_discover_finds_nested_override() {
        let dir = create_overlay();

        let output = subst(&["discover", dir.path().to_str().unwrap()]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(stdout(&output).trim(), "subst");
    }

    #[test]
    fn test_discover_without_override_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kustomization.yaml"), "resources: []\n").unwrap();

        let output = subst(&["discover", dir.path().to_str().unwrap()]);

        assert!(!output.status.success());
        assert_eq!(output.status.code(), Some(6));
        assert!(stdout(&output).is_empty());
        assert!(stderr(&output).contains("subst.yaml"));
    }

    #[test]
    fn test_discover_missing_directory() {
        let output = subst(&["discover", "/definitely/not/a/dir"]);

        assert_eq!(output.status.code(), Some(5));
    }
}

mod render_command {
    use super::*;

    #[test]
    fn test_render_missing_root() {
        let output = subst(&["render", "/definitely/not/a/dir"]);

        assert_eq!(output.status.code(), Some(5));
        assert!(stderr(&output).contains("Root directory not found"));
    }

    #[test]
    fn test_render_invalid_env_regex() {
        let dir = create_overlay();
        let empty_path = TempDir::new().unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_subst"))
            .args(["render", dir.path().to_str().unwrap(), "--env-regex", "(unclosed"])
            .env("PATH", empty_path.path())
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_render_without_kustomize() {
        let dir = create_overlay();
        let empty_path = TempDir::new().unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_subst"))
            .args(["render", dir.path().to_str().unwrap(), "--skip-decrypt"])
            .env("PATH", empty_path.path())
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(69));
        assert!(stderr(&output).contains("kustomize"));
    }

    #[test]
    fn test_render_rejects_unknown_output() {
        let dir = create_overlay();

        let output = subst(&["render", dir.path().to_str().unwrap(), "--output", "toml"]);

        assert!(!output.status.success());
        assert!(stderr(&output).contains("toml"));
    }

    /// Install a fake `kustomize` that prints `manifest.yaml` from the built root
    #[cfg(unix)]
    fn fake_kustomize(bin: &Path) {
        use std::os::unix::fs::PermissionsExt;

        let script = bin.join("kustomize");
        fs::write(&script, "#!/bin/sh\ncat \"$2/manifest.yaml\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    fn render_with_fake_kustomize(dir: &Path, extra: &[&str]) -> Output {
        let bin = dir.join(".bin");
        fs::create_dir_all(&bin).unwrap();
        fake_kustomize(&bin);

        let path = format!("{}:/usr/bin:/bin", bin.display());
        Command::new(env!("CARGO_BIN_EXE_subst"))
            .arg("render")
            .arg(dir)
            .args(["--engine", "jinja", "--skip-decrypt", "--env-regex", "^SUBST_IT_.*$"])
            .args(extra)
            .env("PATH", path)
            .env("SUBST_IT_CLUSTER", "prod")
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_render_yaml_end_to_end() {
        let dir = create_overlay();
        fs::write(
            dir.path().join("manifest.yaml"),
            "name: {{ name }}\nreplicas: {{ replicas }}\ncluster: {{ SUBST_IT_CLUSTER }}\n",
        )
        .unwrap();

        let output = render_with_fake_kustomize(dir.path(), &[]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert_eq!(
            stdout(&output),
            "---\nname: web\nreplicas: 3\ncluster: prod\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_render_json_end_to_end() {
        let dir = create_overlay();
        fs::write(
            dir.path().join("manifest.yaml"),
            "kind: ConfigMap\nreplicas: {{ replicas }}\n---\nkind: Secret\n",
        )
        .unwrap();

        let output = render_with_fake_kustomize(dir.path(), &["--output", "json"]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        let text = stdout(&output);
        let docs: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&text)
            .into_iter::<serde_json::Value>()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["replicas"], 3);
        assert_eq!(docs[1]["kind"], "Secret");
    }

    #[cfg(unix)]
    #[test]
    fn test_render_undefined_variable_fails() {
        let dir = create_overlay();
        fs::write(dir.path().join("manifest.yaml"), "x: {{ nope }}\n").unwrap();

        let output = render_with_fake_kustomize(dir.path(), &[]);

        assert_eq!(output.status.code(), Some(4));
    }
}
