use std::fs;
use std::os::unix::prelude::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Error;

/// Files capturing the output streams of a run script.
#[derive(Clone, Debug)]
pub struct OutputFiles {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

/// Runs `path` with bash in `work_dir`, capturing its output in
/// `{output_prefix}.out` and `{output_prefix}.err`.
pub fn execute_run_script(
    path: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
    output_prefix: &str,
) -> Result<OutputFiles, Error> {
    let path = path.as_ref();
    let work_dir = work_dir.as_ref();

    let stdout = work_dir.join(format!("{output_prefix}.out"));
    let stderr = work_dir.join(format!("{output_prefix}.err"));
    let out_file = fs::File::create(&stdout)?;
    let err_file = fs::File::create(&stderr)?;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;

    tracing::debug!(script = %path.display(), "running magic");
    let status = Command::new("/usr/bin/env")
        .arg("bash")
        .arg(path)
        .current_dir(work_dir)
        .stdout(out_file)
        .stderr(err_file)
        .status()?;

    if !status.success() {
        return Err(Error::Magic(status));
    }

    Ok(OutputFiles { stdout, stderr })
}
