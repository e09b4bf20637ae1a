//! HTML site generation.
//!
//! Second stage of the build pipeline. Takes the fetch manifest and writes
//! the final static site.
//!
//! ## Generated Pages
//!
//! - **Post list** (`/index.html`): first page of posts, newest first, with a
//!   "load more" button while the API has further pages
//! - **Post pages** (`/post/{uid}/index.html`): banner, reading time, edited
//!   note, content sections, previous/next links and the comments widget
//! - **Not found** (`/404.html`): fallback for UIDs without a page
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── 404.html
//! ├── images/logo.svg            # From assets/, copied verbatim
//! └── post/
//!     ├── como-utilizar-hooks/
//!     │   └── index.html
//!     └── criando-um-app-cra-do-zero/
//!         └── index.html
//! ```
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/style.css`: Base styles (colors injected from config)
//! - `static/load_more.js`: Fetches the next list page in the browser
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping; the only
//! unescaped HTML is the embedded script and API-provided oEmbed markup.

use crate::config::{self, CommentsConfig, SiteConfig};
use crate::fetch::{Manifest, PostPage};
use crate::pagination::PaginationState;
use crate::preview::exit_preview_button;
use crate::richtext;
use crate::types::{AdjacentPostRef, Post, is_safe_uid, post_href};
use chrono::{DateTime, FixedOffset};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to walk assets: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("post uid {0:?} cannot be used as a directory name")]
    UnsafeUid(String),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const LOAD_MORE_JS: &str = include_str!("../static/load_more.js");

const UTTERANCES_SRC: &str = "https://utteranc.es/client.js";

/// Render the site described by the manifest at `manifest_path`.
///
/// `assets_root` is the directory the configured `site.assets_dir` is
/// relative to. Returns the manifest for reporting.
pub fn generate(
    manifest_path: &Path,
    output_dir: &Path,
    assets_root: &Path,
) -> Result<Manifest, GenerateError> {
    let manifest_content = fs::read_to_string(manifest_path)?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)?;
    if let Some(page) = manifest.posts.iter().find(|p| !is_safe_uid(&p.detail.uid)) {
        return Err(GenerateError::UnsafeUid(page.detail.uid.clone()));
    }

    let color_css = config::generate_color_css(&manifest.config.colors);
    let css = format!("{}\n\n{}", color_css, CSS_STATIC);
    let ctx = PageContext {
        config: &manifest.config,
        css: &css,
        preview: manifest.preview,
    };

    fs::create_dir_all(output_dir)?;

    let assets_dir = assets_root.join(&manifest.config.site.assets_dir);
    if assets_dir.is_dir() {
        copy_dir_recursive(&assets_dir, output_dir)?;
    }

    let index_html = render_index(&manifest.index, &ctx);
    fs::write(output_dir.join("index.html"), index_html.into_string())?;

    for page in &manifest.posts {
        let post_dir = output_dir.join("post").join(&page.detail.uid);
        fs::create_dir_all(&post_dir)?;
        let post_html = render_post_page(page, &ctx);
        fs::write(post_dir.join("index.html"), post_html.into_string())?;
        debug!(uid = %page.detail.uid, "rendered post page");
    }

    let not_found_html = render_not_found(&ctx);
    fs::write(output_dir.join("404.html"), not_found_html.into_string())?;

    info!(
        posts = manifest.posts.len(),
        output = %output_dir.display(),
        "site generated"
    );
    Ok(manifest)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), GenerateError> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Settings shared by every page of one build.
struct PageContext<'a> {
    config: &'a SiteConfig,
    css: &'a str,
    preview: bool,
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, ctx: &PageContext, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(html_lang(&ctx.config.locale.name)) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(ctx.css)) }
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// `pt_BR` -> `pt-BR`
fn html_lang(locale: &str) -> String {
    locale.replace('_', "-")
}

/// Renders the site header: the logo, linking home
fn site_header(config: &SiteConfig) -> Markup {
    html! {
        header.site-header {
            a href="/" {
                img.logo src=(config.site.logo) alt="logo";
            }
        }
    }
}

/// A publication date in the configured locale and format; empty when unknown.
pub fn format_date(at: Option<&DateTime<FixedOffset>>, config: &SiteConfig) -> String {
    at.map(|at| {
        at.format_localized(&config.locale.date_format, config.chrono_locale())
            .to_string()
    })
    .unwrap_or_default()
}

/// Date and author line shared by list entries and post pages.
fn post_info(
    published_at: Option<&DateTime<FixedOffset>>,
    author: &str,
    reading_time: Option<u32>,
    config: &SiteConfig,
) -> Markup {
    html! {
        div.post-info {
            @if let Some(at) = published_at {
                time datetime=(at.to_rfc3339()) { (format_date(Some(at), config)) }
            }
            span.author { (author) }
            @if let Some(minutes) = reading_time {
                span.reading-time { (minutes) " min" }
            }
        }
    }
}

fn post_list_item(post: &Post, config: &SiteConfig) -> Markup {
    html! {
        li.post-item {
            a href=(post.href()) {
                h1 { (post.title) }
                h2 { (post.subtitle) }
                (post_info(post.published_at.as_ref(), &post.author, None, config))
            }
        }
    }
}

fn adjacent_link(post: &AdjacentPostRef, class: &str, caption: &str) -> Markup {
    html! {
        a class=(class) href=(post_href(&post.uid)) rel=(class) {
            span { (post.title) }
            small { (caption) }
        }
    }
}

/// The utterances comments widget
fn comments_widget(comments: &CommentsConfig) -> Markup {
    html! {
        section.comments {
            script
                src=(UTTERANCES_SRC)
                repo=(comments.repo)
                issue-term=(comments.issue_term)
                theme=(comments.theme)
                crossorigin="anonymous"
                async {}
        }
    }
}

fn preview_exit(ctx: &PageContext) -> Markup {
    html! {
        @if ctx.preview {
            (exit_preview_button(&ctx.config.preview, &ctx.config.locale.exit_preview_label))
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the post list
fn render_index(index: &PaginationState, ctx: &PageContext) -> Markup {
    let config = ctx.config;
    let content = html! {
        (site_header(config))
        main.container.post-list {
            ul #posts data-locale=(html_lang(&config.locale.name)) {
                @for post in index.posts() {
                    (post_list_item(post, config))
                }
            }
            @if let Some(cursor) = index.next_cursor() {
                button #load-more .load-more type="button" data-next-page=(cursor.as_str()) {
                    (config.locale.load_more_label)
                }
                script { (PreEscaped(LOAD_MORE_JS)) }
            }
            (preview_exit(ctx))
        }
    };
    base_document(&config.site.title, ctx, None, content)
}

/// Renders one post page
fn render_post_page(page: &PostPage, ctx: &PageContext) -> Markup {
    let config = ctx.config;
    let post = &page.detail;
    let page_title = format!("{} | {}", post.title, config.site.title);

    let content = html! {
        (site_header(config))
        @if let Some(banner) = &post.banner_url {
            img.banner src=(banner) alt="banner";
        }
        main.container.post-page {
            article {
                h1 { (post.title) }
                (post_info(
                    post.published_at.as_ref(),
                    &post.author,
                    Some(post.reading_time_minutes),
                    config,
                ))
                @if let Some(label) = &post.edited_label {
                    p.edited { (label) }
                }
                @for block in &post.blocks {
                    section.post-block data-key=(block.key) {
                        h2 { (block.heading) }
                        div.post-body {
                            (richtext::as_html(&block.body))
                        }
                    }
                }
            }
            @if page.adjacent.prev.is_some() || page.adjacent.next.is_some() {
                nav.post-navigation {
                    @if let Some(prev) = &page.adjacent.prev {
                        (adjacent_link(prev, "prev", &config.locale.previous_post_label))
                    }
                    @if let Some(next) = &page.adjacent.next {
                        (adjacent_link(next, "next", &config.locale.next_post_label))
                    }
                }
            }
            @if config.comments.enabled() {
                (comments_widget(&config.comments))
            }
            (preview_exit(ctx))
        }
    };
    base_document(&page_title, ctx, Some("post"), content)
}

/// Renders the not-found fallback
fn render_not_found(ctx: &PageContext) -> Markup {
    let config = ctx.config;
    let content = html! {
        (site_header(config))
        main.container.not-found {
            h1 { "404" }
            p { (config.locale.not_found_label) }
            p { a href="/" { (config.site.title) } }
        }
    };
    base_document(&config.locale.not_found_label, ctx, None, content)
}

// ============================================================================
// Tests
// ============================================================================
