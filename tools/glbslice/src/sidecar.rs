//! Size record written next to aligned assets

use anyhow::{Context, Result};
use glbslice_core::SizeRecord;
use std::path::{Path, PathBuf};

/// `<dir>/<stem>_size.txt` for an asset at `<dir>/<stem>.glb`
pub fn sidecar_path(asset: &Path) -> PathBuf {
    let stem = asset
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    asset.with_file_name(format!("{stem}_size.txt"))
}

/// Write `record` beside `asset`, returning the sidecar path
pub fn write_sidecar(asset: &Path, record: &SizeRecord) -> Result<PathBuf> {
    let path = sidecar_path(asset);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(&path, record.to_string())
        .with_context(|| format!("Failed to write size record: {}", path.display()))?;
    Ok(path)
}
