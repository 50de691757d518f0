//! A content-filtering engine: Adblock-Plus/uBO-style rule parsing,
//! per-request block/allow/redirect decisions, and cosmetic CSS/JS
//! injection for matching pages.

pub mod cache;
pub mod config;
pub mod container;
pub mod cosmetic;
pub mod domain;
pub mod engine;
pub mod error;
pub mod filter;
pub mod handler;
pub mod hash;
pub mod log;
pub mod parser;
pub mod resources;
pub mod subscription;
pub mod types;

pub use config::{EngineConfig, Settings};
pub use engine::Engine;
pub use error::{FilterCoreError, Result};
pub use filter::Filter;
pub use handler::RequestContext;
pub use types::{Decision, ElementType, FilterCategory};
