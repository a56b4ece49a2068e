//! Print dispatch: hand the assembled sheets to the host print facility.
//!
//! There is no separate rendering path for printing: the same composed
//! document is written to a managed temp file and handed to the platform
//! spooler. The temp file lives only as long as the spooler needs to read
//! it.

use crate::error::SheetError;
use std::path::Path;
use tracing::info;

/// Send a finished PDF to the host print spooler.
///
/// The bytes are written to a temp directory that is cleaned up when this
/// function returns; spoolers copy the job on submission, so the file does
/// not need to outlive the call.
pub async fn spool_document(pdf: &[u8], job_name: &str) -> Result<(), SheetError> {
    let temp_dir = tempfile::TempDir::new().map_err(|e| SheetError::Internal(e.to_string()))?;
    let path = temp_dir.path().join("polaroid-a4-sheets.pdf");
    tokio::fs::write(&path, pdf)
        .await
        .map_err(|e| SheetError::Internal(format!("temp spool file: {e}")))?;

    info!("Submitting {} byte print job '{}'", pdf.len(), job_name);
    let path_clone = path.clone();
    let job = job_name.to_string();
    // The spooler command blocks until the job is accepted.
    tokio::task::spawn_blocking(move || dispatch(&path_clone, &job))
        .await
        .map_err(|e| SheetError::Internal(format!("print task panicked: {e}")))?
}

#[cfg(unix)]
fn dispatch(path: &Path, job_name: &str) -> Result<(), SheetError> {
    use std::process::Command;

    // `lp` is the CUPS front door; fall back to BSD `lpr` where lp is absent.
    let attempts: [(&str, Vec<&std::ffi::OsStr>); 2] = [
        (
            "lp",
            vec![
                "-t".as_ref(),
                job_name.as_ref(),
                "--".as_ref(),
                path.as_os_str(),
            ],
        ),
        ("lpr", vec!["-T".as_ref(), job_name.as_ref(), path.as_os_str()]),
    ];

    let mut last_err = String::new();
    for (program, args) in attempts {
        match Command::new(program).args(&args).output() {
            Ok(out) if out.status.success() => return Ok(()),
            Ok(out) => {
                last_err = format!(
                    "{program} exited with {}: {}",
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                last_err = format!("{program} not found");
            }
            Err(e) => {
                last_err = format!("{program}: {e}");
            }
        }
    }

    Err(SheetError::PrintSpoolerFailed { detail: last_err })
}

#[cfg(windows)]
fn dispatch(path: &Path, _job_name: &str) -> Result<(), SheetError> {
    use std::process::Command;

    let out = Command::new("powershell")
        .args([
            "-NoProfile",
            "-Command",
            &format!("Start-Process -FilePath '{}' -Verb Print -Wait", path.display()),
        ])
        .output()
        .map_err(|e| SheetError::PrintSpoolerFailed {
            detail: format!("powershell: {e}"),
        })?;

    if out.status.success() {
        Ok(())
    } else {
        Err(SheetError::PrintSpoolerFailed {
            detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        })
    }
}

#[cfg(not(any(unix, windows)))]
fn dispatch(_path: &Path, _job_name: &str) -> Result<(), SheetError> {
    Err(SheetError::PrintUnsupported)
}
