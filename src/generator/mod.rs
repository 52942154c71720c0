//! Generator module - renders posts, pages and listings into an output tree

mod pagination;

pub use pagination::{paginate, PageLink, Pagination};

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tera::Context;

use crate::content::loader::INDEX_FILE;
use crate::content::{ContentError, Page, Post, Tag};
use crate::templates::{
    self, TemplateRenderer, INDEX_TEMPLATE, PAGE_TEMPLATE, POST_TEMPLATE, TAG_TEMPLATE,
};
use crate::Site;

/// Static site generator using Tera templates
pub struct Generator {
    site: Site,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator, loading the site's templates
    pub fn new(site: &Site) -> Result<Self> {
        let renderer = TemplateRenderer::load(&site.templates_dir)?;

        Ok(Self {
            site: site.clone(),
            renderer,
        })
    }

    /// Generate the entire site into `output_dir`
    pub fn generate(
        &self,
        posts: &[Post],
        pages: &[Page],
        tags: &[Tag],
        output_dir: &Path,
    ) -> Result<()> {
        check_slugs(posts, pages)?;

        fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {:?}", output_dir))?;

        let static_dir = output_dir.join(templates::STATIC_DIR);
        templates::copy_static(&self.site.templates_dir, &static_dir)?;

        self.generate_post_pages(posts, pages, output_dir)?;
        self.generate_page_pages(pages, output_dir)?;
        self.generate_tag_pages(posts, pages, tags, output_dir)?;
        self.generate_index_pages(posts, pages, tags, output_dir)?;

        Ok(())
    }

    /// Create a base context with common variables
    fn create_base_context(&self, pages: &[Page]) -> Context {
        let mut context = Context::new();
        context.insert("site_title", &self.site.config.site_title);
        context.insert("meta_description", &self.site.config.meta_description);
        context.insert("pages", pages);
        context
    }

    /// Generate individual post pages
    fn generate_post_pages(
        &self,
        posts: &[Post],
        pages: &[Page],
        output_dir: &Path,
    ) -> Result<()> {
        for post in posts {
            let post_dir = output_dir.join(&post.slug);
            copy_assets(&post.source_dir, &post_dir)?;

            let mut context = self.create_base_context(pages);
            context.insert("post", post);

            let html = self.renderer.render(POST_TEMPLATE, &context)?;
            write_page(&post_dir.join("index.html"), &html)?;
        }

        tracing::info!("Generated {} posts", posts.len());
        Ok(())
    }

    /// Generate standalone pages
    fn generate_page_pages(&self, pages: &[Page], output_dir: &Path) -> Result<()> {
        for page in pages {
            let page_dir = output_dir.join(&page.slug);
            copy_assets(&page.source_dir, &page_dir)?;

            let mut context = self.create_base_context(pages);
            context.insert("page", page);

            let html = self.renderer.render(PAGE_TEMPLATE, &context)?;
            write_page(&page_dir.join("index.html"), &html)?;
        }

        tracing::info!("Generated {} pages", pages.len());
        Ok(())
    }

    /// Generate tag listings, paginated
    fn generate_tag_pages(
        &self,
        posts: &[Post],
        pages: &[Page],
        tags: &[Tag],
        output_dir: &Path,
    ) -> Result<()> {
        for tag in tags {
            let tag_posts: Vec<&Post> = posts.iter().filter(|p| p.has_tag(tag)).collect();
            let groups = paginate(&tag_posts, self.site.config.page_size());
            let url_prefix = format!("{}/", tag.url);
            let tag_dir = output_dir.join("tags").join(&tag.slug);

            for (index, group) in groups.iter().enumerate() {
                let mut context = self.create_base_context(pages);
                context.insert("tag", tag);
                context.insert("posts", group);
                context.insert("tags", tags);
                let pagination = Pagination::new(groups.len(), index, &url_prefix);
                insert_pagination(&mut context, &pagination);

                let html = self.renderer.render(TAG_TEMPLATE, &context)?;
                write_page(&Pagination::output_path(&tag_dir, index), &html)?;
            }
        }

        tracing::info!("Generated {} tag listings", tags.len());
        Ok(())
    }

    /// Generate the home listing, paginated
    fn generate_index_pages(
        &self,
        posts: &[Post],
        pages: &[Page],
        tags: &[Tag],
        output_dir: &Path,
    ) -> Result<()> {
        let groups = paginate(posts, self.site.config.page_size());

        for (index, group) in groups.iter().enumerate() {
            let mut context = self.create_base_context(pages);
            context.insert("site_subtitle", &self.site.config.site_subtitle);
            context.insert("posts", group);
            context.insert("tags", tags);
            insert_pagination(&mut context, &Pagination::new(groups.len(), index, "/"));

            let html = self.renderer.render(INDEX_TEMPLATE, &context)?;
            write_page(&Pagination::output_path(output_dir, index), &html)?;
        }

        tracing::info!("Generated {} index pages", groups.len());
        Ok(())
    }
}

/// Expose pagination under the names templates use
fn insert_pagination(context: &mut Context, pagination: &Pagination) {
    context.insert("pagination", &pagination.pages);
    context.insert("next_group", &pagination.next);
    context.insert("prev_group", &pagination.prev);
}

/// Posts and pages share the output root, so their slugs must not collide
fn check_slugs(posts: &[Post], pages: &[Page]) -> Result<(), ContentError> {
    let post_slugs: HashSet<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
    if let Some(page) = pages.iter().find(|p| post_slugs.contains(p.slug.as_str())) {
        return Err(ContentError::DuplicateSlug {
            slug: page.slug.clone(),
        });
    }

    let slugs = posts
        .iter()
        .map(|p| p.slug.as_str())
        .chain(pages.iter().map(|p| p.slug.as_str()));
    for slug in slugs {
        if is_reserved_slug(slug) {
            tracing::warn!("Slug {:?} shares its path with generated output", slug);
        }
    }

    Ok(())
}

/// Output folders the generator writes on its own
fn is_reserved_slug(slug: &str) -> bool {
    slug == templates::STATIC_DIR
        || slug == "tags"
        || (!slug.is_empty() && slug.chars().all(|c| c.is_ascii_digit()))
}

/// Copy everything in a content folder except its index.md
fn copy_assets(source_dir: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {:?}", dest))?;

    let entries =
        fs::read_dir(source_dir).with_context(|| format!("Failed to list {:?}", source_dir))?;
    let mut entries = entries
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list {:?}", source_dir))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_name() == INDEX_FILE {
            continue;
        }
        let path = entry.path();
        let target = dest.join(entry.file_name());
        if path.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {:?}", target))?;
            templates::copy_dir(&path, &target)?;
        } else {
            fs::copy(&path, &target)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, target))?;
            tracing::debug!("Copied: {:?} -> {:?}", path, target);
        }
    }

    Ok(())
}

/// Write one rendered page, creating its directory
fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, html).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Generated: {:?}", path);
    Ok(())
}
