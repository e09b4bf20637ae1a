//! # spacetraveling
//!
//! A static blog generator. Posts live in a headless CMS behind a paginated
//! document-query API; spacetraveling pulls them, shapes them into the few
//! fields each page needs, and renders plain HTML.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Fetch     document API  →  manifest.json   (API documents → page data)
//! 2. Generate  manifest      →  dist/           (final HTML site)
//! ```
//!
//! The manifest is human-readable JSON. It can be inspected between stages,
//! and `generate` can be re-run against it offline while iterating on
//! templates or styles.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cms`] | Document API adapter: predicate queries, cursor pages, UID lookup |
//! | [`richtext`] | Structured rich text: plain-text flattening and HTML rendering |
//! | [`projection`] | Raw documents → list entries and post page fields |
//! | [`pagination`] | "Load more": immutable list state advanced one cursor at a time |
//! | [`assemble`] | Post pages: reading time, rendering keys, edited label |
//! | [`adjacent`] | Previous/next post resolution |
//! | [`fetch`] | Stage 1: drives the above and writes the manifest |
//! | [`generate`] | Stage 2: renders the manifest to HTML using Maud |
//! | [`preview`] | Preview-mode session and exit button |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`telemetry`] | Diagnostic logging setup |
//! | [`types`] | Shared types serialized between stages |
//! | [`output`] | CLI output formatting of pipeline results |
//!
//! # Design Decisions
//!
//! ## The API Is Behind a Trait
//!
//! Every stage talks to the CMS through [`cms::DocumentClient`]. The HTTP
//! client is one implementation; the tests drive the whole pipeline with an
//! in-memory collection that honours the same ordering, `after` and cursor
//! semantics.
//!
//! ## Pagination State Is a Value
//!
//! [`pagination::load_next_page`] borrows a state and returns a new one. A
//! failed load can never leave a half-appended list behind: the caller still
//! holds the last good state.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time HTML
//! macro system. Template variables are Rust expressions, all interpolation
//! is auto-escaped, and there is no template directory to ship.

pub mod adjacent;
pub mod assemble;
pub mod cms;
pub mod config;
pub mod fetch;
pub mod generate;
pub mod output;
pub mod pagination;
pub mod preview;
pub mod projection;
pub mod richtext;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
