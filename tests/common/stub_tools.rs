// Stub executables standing in for the external tools
//
// The engine talks to smartctl, lsblk, dd, xxd and the erasure tools
// only through a shell and their stdout/stderr/exit code, so tests can
// substitute tiny shell scripts by prepending a scratch directory to
// PATH. The real tools are never touched.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::TempDir;

/// A scratch bin directory placed at the front of PATH for the lifetime
/// of the value. Restores the previous PATH on drop.
pub struct StubToolbox {
    dir: TempDir,
    saved_path: String,
}

impl StubToolbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create stub toolbox dir");
        let saved_path = std::env::var("PATH").unwrap_or_default();
        std::env::set_var(
            "PATH",
            format!("{}:{}", dir.path().display(), saved_path),
        );
        Self { dir, saved_path }
    }

    /// Install a stub tool. `body` is the script after the shebang.
    pub fn install(&self, name: &str, body: &str) {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub tool");
        let mut perms = fs::metadata(&path).expect("stat stub tool").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod stub tool");
    }

    /// Install an `xxd` whose hex output changes on every invocation, so
    /// read-after-write comparisons always observe fresh bytes.
    pub fn install_counting_xxd(&self) {
        self.install(
            "xxd",
            r#"state="$(dirname "$0")/xxd.calls"
n=0
[ -f "$state" ] && n=$(cat "$state")
n=$((n+1))
printf '%s' "$n" > "$state"
cat > /dev/null
printf 'feedc0de%08d\n' "$n""#,
        );
    }

    /// Install an `xxd` that always reports the same bytes, simulating a
    /// device that silently ignores writes.
    pub fn install_constant_xxd(&self) {
        self.install(
            "xxd",
            r#"cat > /dev/null
printf 'cafebabe0000\n'"#,
        );
    }

    /// A `dd` that accepts anything and writes nothing.
    pub fn install_inert_dd(&self) {
        self.install("dd", "exit 0");
    }

    /// Install a stub that records its invocation in `<name>.invoked`
    /// next to itself and exits with `code`.
    pub fn install_tracking(&self, name: &str, code: i32) {
        self.install(
            name,
            &format!("touch \"$(dirname \"$0\")/{name}.invoked\"\nexit {code}"),
        );
    }

    /// Whether a stub installed with [`Self::install_tracking`] ever ran.
    pub fn was_invoked(&self, name: &str) -> bool {
        self.dir.path().join(format!("{name}.invoked")).exists()
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for StubToolbox {
    fn drop(&mut self) {
        std::env::set_var("PATH", &self.saved_path);
    }
}
