//! Test fixtures
//!
//! Canned svn output and configurations shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use svndeploy::domain::entities::{HostTarget, RepositoryConfig};
use svndeploy::domain::value_objects::RepositoryUrl;

/// `svn log -q --limit 1` output for revision 1967
pub const LOG_MSG: &str = "------------------------------------------------------------------------
r1967 | minam | 2005-08-03 06:59:03 -0600 (Wed, 03 Aug 2005) | 2 lines

Initial commit of the new capistrano utility

------------------------------------------------------------------------";

pub const PASSWORD: &str = "chocolatebrownies";

/// Repository `/hello/world`, client `/path/to/svn`, generic password set
pub fn base_config() -> RepositoryConfig {
    RepositoryConfig::new(RepositoryUrl::new("/hello/world").unwrap())
        .with_svn("/path/to/svn")
        .with_password(PASSWORD)
}

pub fn target() -> HostTarget {
    HostTarget::new("/mwa/ha/ha/releases/20240101", "/mwa/ha/ha/current")
}

/// Shell script standing in for `svn`: records its arguments next to itself
/// and, for `export` and `checkout`, materializes a small tree at the
/// destination (last argument)
#[cfg(unix)]
pub fn fake_svn(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("svn");
    let args_file = dir.join("svn.args");
    let calls_file = dir.join("svn.calls");
    let body = format!(
        "#!/bin/sh\n\
         echo \"$@\" > '{}'\n\
         echo \"$@\" >> '{}'\n\
         for last; do :; done\n\
         case \"$1\" in export|checkout)\n\
         mkdir -p \"$last/lib\" && echo hello > \"$last/index.html\" && echo app > \"$last/lib/app.rb\" ;;\n\
         esac\n",
        args_file.display(),
        calls_file.display()
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Every invocation of the fake svn, one line of arguments each
pub fn fake_svn_calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("svn.calls"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Arguments the fake svn was last called with
pub fn fake_svn_args(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("svn.args"))
        .unwrap()
        .trim()
        .to_string()
}
