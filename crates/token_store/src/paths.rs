use std::path::{Path, PathBuf};

pub const TOKEN_DIR: &str = ".agency";
/// Storage key of the credential token; also the file stem on disk.
pub const TOKEN_KEY: &str = "token";

#[must_use]
pub fn token_root(cwd: &Path) -> PathBuf {
    cwd.join(TOKEN_DIR)
}

#[must_use]
pub fn token_file_path(root: &Path) -> PathBuf {
    root.join(format!("{TOKEN_KEY}.json"))
}
