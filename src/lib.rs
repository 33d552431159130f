//! # mylist-exporter
//!
//! Exports a user's reading-list collection from a GraphQL comic site into
//! self-contained offline files.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Merge → (Cover pool) → Export
//! ```
//!
//! - [`fetcher`]: paged list query, cursor-walked history, cover downloads
//! - [`normalizer`]: Converts raw GraphQL payloads to domain models
//! - [`merge`]: Attaches the newest history record to each entry
//! - [`export`]: HTML, editable HTML, PDF, CSV and JSON generators
//!
//! ## Quick Start
//!
//! ```bash
//! # Interactive HTML for user 1234
//! mylist-exporter export --user 1234 --name Jane
//!
//! # Everything, with embedded covers
//! mylist-exporter export --user 1234 --name Jane --all --covers
//!
//! # Re-render a saved snapshot as PDF
//! mylist-exporter render --input bato_export_Jane_2024-06-01.json --pdf
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the transport,
/// the paginated fetcher and the cover pool.
pub mod app;

/// Command-line interface using clap.
///
/// - `export` - Fetch and export a collection
/// - `render` - Regenerate files from a JSON snapshot or editable HTML
/// - `edit` - Add, update or remove entries of a saved snapshot
pub mod cli;

/// Configuration loaded from `~/.config/mylist-exporter/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`CollectionList`](domain::CollectionList) and [`ComicEntry`](domain::ComicEntry)
/// - [`HistoryIndex`](domain::HistoryIndex): newest read per comic
/// - [`Snapshot`](domain::Snapshot): serialized export
/// - [`EditableDataset`](domain::EditableDataset): add/edit/delete over a snapshot
pub mod domain;

/// Output generators.
pub mod export;

/// Network access.
///
/// - [`Transport`](fetcher::Transport): Async trait over HTTP
/// - [`PaginatedFetcher`](fetcher::paginated::PaginatedFetcher): list and history walks
/// - [`CoverPool`](fetcher::covers::CoverPool): fixed-size cover download pool
pub mod fetcher;

/// History merge.
pub mod merge;

/// GraphQL payload normalization.
pub mod normalizer;
