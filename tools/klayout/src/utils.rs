use std::fs;
use std::os::unix::prelude::PermissionsExt;
use std::path::Path;
use std::process::Command;

use crate::error::Error;

pub fn execute_run_script(
    path: impl AsRef<Path>,
    work_dir: impl AsRef<Path>,
    output_prefix: &str,
) -> Result<(), Error> {
    let path = path.as_ref();
    let work_dir = work_dir.as_ref();

    let out_file = fs::File::create(work_dir.join(format!("{output_prefix}.out")))?;
    let err_file = fs::File::create(work_dir.join(format!("{output_prefix}.err")))?;

    // Make the run script executable
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;

    tracing::debug!(script = %path.display(), "running klayout");
    let status = Command::new("/usr/bin/env")
        .arg("bash")
        .arg(path)
        .current_dir(work_dir)
        .stdout(out_file)
        .stderr(err_file)
        .status()?;

    if !status.success() {
        return Err(Error::KLayout(status));
    }

    Ok(())
}
