//! Stratowatch Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the Stratowatch
//! engine to run against both the **real world** (tokio clock, HTTP feed)
//! and **scripted test environments** (virtual clock, canned feed).
//!
//! Two seams are intercepted:
//! - Time (`now()`, `sleep()`)
//! - The inbound snapshot feed (`fetch()`)
//!
//! The engine never touches a socket or the system clock directly, so a
//! refresh-cycle bug can be reproduced from a scripted feed transcript.
//!
//! # Example
//!
//! ```ignore
//! use stratowatch_env::{HostContext, SnapshotFeed, FeedQuery};
//!
//! async fn refresh_loop<Ctx: HostContext, Feed: SnapshotFeed>(
//!     ctx: &Ctx,
//!     feed: &Feed,
//! ) {
//!     loop {
//!         let doc = feed.fetch(&FeedQuery::default()).await;
//!         // ... hand to the engine ...
//!         ctx.sleep(std::time::Duration::from_secs(900)).await;
//!     }
//! }
//! ```

mod context;
mod error;
mod feed;
mod tokio_impl;

pub use context::HostContext;
pub use error::FeedError;
pub use feed::{FeedQuery, SnapshotFeed};
pub use tokio_impl::TokioContext;
