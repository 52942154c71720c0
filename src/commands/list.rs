//! List site content

use anyhow::Result;
use std::io::{self, Write};

use crate::content::{aggregate_tags, ContentLoader};
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let stdout = io::stdout();
    write_listing(site, content_type, &mut stdout.lock())
}

fn write_listing(site: &Site, content_type: &str, out: &mut impl Write) -> Result<()> {
    let loader = ContentLoader::new(site);

    match content_type {
        "post" | "posts" => {
            let posts = loader.load_posts()?;
            writeln!(out, "Posts ({}):", posts.len())?;
            for post in posts {
                writeln!(
                    out,
                    "  {} - {} [{}]",
                    post.date.as_deref().unwrap_or("(no date)"),
                    post.title,
                    post.slug
                )?;
            }
        }
        "page" | "pages" => {
            let pages = loader.load_pages()?;
            writeln!(out, "Pages ({}):", pages.len())?;
            for page in pages {
                writeln!(out, "  {:>3} {} [{}]", page.order, page.title, page.slug)?;
            }
        }
        "tag" | "tags" => {
            let posts = loader.load_posts()?;
            let tags = aggregate_tags(&posts);
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                let count = posts.iter().filter(|p| p.has_tag(&tag)).count();
                writeln!(out, "  {} ({}) {}", tag.title, count, tag.url)?;
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, page, tag", content_type);
        }
    }

    Ok(())
}
