//! Git credential store file.
//!
//! Git's `store` credential helper reads `https://<user>:<password>@<host>`
//! lines. GitHub accepts a personal access token as the user with an empty
//! password.

use std::fs;
use std::io::Write;
use std::path::Path;

use super::GitResult;

/// Host the token is scoped to.
const CREDENTIAL_HOST: &str = "github.com";

/// Formats the credential line for a GitHub token.
pub fn credentials_line(token: &str) -> String {
    format!("https://{}:@{}\n", token, CREDENTIAL_HOST)
}

/// Writes (or replaces) the credential store file holding `token`.
///
/// On unix the file is created with mode 0600 since it holds a secret.
pub fn write_credentials(file: &Path, token: &str) -> GitResult<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut f = options.open(file)?;
    f.write_all(credentials_line(token).as_bytes())?;
    f.sync_all()?;
    Ok(())
}
