//! Client library for the [mod.io](https://mod.io) mod-distribution
//! service.
//!
//! The entry point is [`Modio`], created from a [`ClientConfig`]. Every
//! endpoint call dispatches onto a worker task and returns immediately;
//! results are delivered to the continuation passed with the call,
//! exactly once. Record views borrow the parsed response document and
//! are valid only inside the continuation (see [`modkit_core::Doc`]).
//!
//! ```no_run
//! use modkit::{ClientConfig, Environment, Modio};
//!
//! let client = Modio::init(
//!     ClientConfig::new("0123456789abcdef0123456789abcdef")
//!         .with_environment(Environment::Test)
//!         .with_root("/var/lib/mygame/mods")
//!         .with_unzip(true),
//! )
//! .unwrap();
//!
//! client.get_mods(None, 309, |outcome| {
//!     if let Ok((mods, pagination)) = outcome {
//!         println!("{} of {} mods", mods.len(), pagination.total);
//!     }
//! });
//! ```

mod auth;
mod client;
mod config;
mod dispatch;
mod install;
mod routes;

pub use client::{Modio, PageResult, SubscriptionChange};
pub use config::{ClientConfig, Environment};
pub use install::InstalledMod;

// Re-export the types continuations receive, and the transport seam.
pub use modkit_core::{
    Dependency, Doc, Error, Event, EventType, Game, InitError, Mod, ModStatus, Modfile, Pagination,
    Rating, Result, Stats, User,
};
pub use modkit_http::{FaultConfig, Transport};
