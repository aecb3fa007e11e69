//! # docshelf
//!
//! Search and download documents kept as parallel HTML, Excel and PDF
//! exports that share a base file name.
//!
//! ```text
//! JMP MAPS/Map1.html ─┐
//! JMP EXCEL/Map1.xlsx ─┼──▶ FileIndex ──▶ "Map1": { html, excel, pdf }
//! JMP PDF/Map2.pdf  ──┘        │
//!                    ┌─────────┴─────────┐
//!                    ▼                   ▼
//!               ┌──────────┐       ┌──────────┐
//!               │   CLI    │       │   HTTP   │
//!               │(docshelf)│       │  (axum)  │
//!               └──────────┘       └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and folder layout |
//! | [`models`] | Categories, entries, search hits, health report |
//! | [`error`] | Not-found / internal error taxonomy |
//! | [`index`] | Folder scanning, search and download resolution |
//! | [`server`] | HTTP routes |
//! | [`status`] | Terminal rendering of the health report |

pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod server;
pub mod status;
