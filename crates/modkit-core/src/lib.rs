//! Core domain types for the modkit client.
//!
//! This crate holds everything that is independent of the HTTP stack:
//! the record views decoded from service responses, the borrowed
//! document accessor, the error taxonomy, and the on-disk layout rules.
//! The transport lives in `modkit-http`; the client itself in `modkit`.

pub mod doc;
pub mod error;
pub mod layout;
pub mod types;

pub use doc::Doc;
pub use error::{Error, InitError, Result};
pub use layout::Layout;
pub use types::{
    decode_page, Dependency, Event, EventType, FromDoc, Game, Mod, ModStatus, Modfile, Pagination,
    Rating, Stats, User,
};
