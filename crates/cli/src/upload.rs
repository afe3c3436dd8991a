use std::path::Path;

pub const MISSING_FILE: &str = "Please select a file first.";
pub const NOT_CSV: &str = "Please upload a valid CSV file.";
pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";

/// Checks a dataset path before it is sent to the service.
pub fn validate_csv(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("{MISSING_FILE} ({} not found)", path.display());
    }
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        anyhow::bail!("{NOT_CSV} ({})", path.display());
    }
    Ok(())
}
