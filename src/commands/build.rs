//! Build the static site
//!
//! Every build is a full rebuild. The site is rendered into a staging
//! directory next to the output directory, which replaces the output only once
//! every page was written, so a failed build leaves the previous output alone.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::content::{aggregate_tags, ContentLoader};
use crate::generator::Generator;
use crate::Site;

/// Build the whole site into its output directory
pub fn run(site: &Site) -> Result<()> {
    let start = std::time::Instant::now();

    // Load content
    let loader = ContentLoader::new(site);
    let posts = loader.load_posts()?;
    let pages = loader.load_pages()?;
    let tags = aggregate_tags(&posts);

    tracing::info!(
        "Loaded {} posts, {} pages and {} tags",
        posts.len(),
        pages.len(),
        tags.len()
    );

    let generator = Generator::new(site)?;

    let staging = staging_dir(&site.output_dir)?;
    remove_dir_if_exists(&staging)?;

    if let Err(e) = generator.generate(&posts, &pages, &tags, &staging) {
        if let Err(cleanup) = remove_dir_if_exists(&staging) {
            tracing::warn!("Failed to remove staging directory: {:#}", cleanup);
        }
        return Err(e);
    }

    publish(&staging, &site.output_dir)?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {:?} in {:.2}s",
        site.output_dir,
        duration.as_secs_f64()
    );

    Ok(())
}

/// Sibling directory a build is rendered into before it is published
pub fn staging_dir(output_dir: &Path) -> Result<PathBuf> {
    let name = output_dir
        .file_name()
        .ok_or_else(|| anyhow!("Output directory {:?} has no name", output_dir))?;
    let mut staging = name.to_os_string();
    staging.push(".staging");
    Ok(output_dir.with_file_name(staging))
}

/// Replace the output directory with the staging directory
fn publish(staging: &Path, output_dir: &Path) -> Result<()> {
    remove_dir_if_exists(output_dir)?;
    fs::rename(staging, output_dir)
        .with_context(|| format!("Failed to move {:?} to {:?}", staging, output_dir))?;
    Ok(())
}

/// Remove a directory tree; a missing directory is already clean
fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", dir)),
    }
}
