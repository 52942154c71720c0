//! Clean the output directory

use anyhow::{Context, Result};
use std::fs;

use super::build::staging_dir;
use crate::Site;

/// Remove the output directory and any staging directory left by a failed build
pub fn run(site: &Site) -> Result<()> {
    let staging = staging_dir(&site.output_dir)?;
    for dir in [&site.output_dir, &staging] {
        if dir.exists() {
            fs::remove_dir_all(dir).with_context(|| format!("Failed to remove {:?}", dir))?;
            tracing::info!("Deleted: {:?}", dir);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_output() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        fs::create_dir_all(site.output_dir.join("nested")).unwrap();
        fs::create_dir_all(staging_dir(&site.output_dir).unwrap()).unwrap();

        run(&site).unwrap();
        assert!(!site.output_dir.exists());
        assert!(!staging_dir(&site.output_dir).unwrap().exists());
    }

    #[test]
    fn test_clean_without_output() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        run(&site).unwrap();
    }
}
