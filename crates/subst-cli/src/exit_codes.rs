//! Exit codes of the `subst` binary
//!
//! These follow sysexits.h where a matching code exists.

/// Unspecified failure
pub const ERROR: i32 = 1;

/// Invalid configuration, key material or environment regex
pub const CONFIG_ERROR: i32 = 2;

/// `kustomize build` failed or produced nothing
pub const BUILD_ERROR: i32 = 3;

/// Template rendering failed
pub const RENDER_ERROR: i32 = 4;

/// Filesystem error, including a missing root directory
pub const IO_ERROR: i32 = 5;

/// `discover` found no override file
pub const NOT_FOUND: i32 = 6;

/// A required external binary is not installed (EX_UNAVAILABLE)
pub const UNAVAILABLE: i32 = 69;
