//! Pluggable conversation-history storage for agent runtimes.
//!
//! A [`Session`] is an ordered history of opaque JSON items keyed by a
//! session id. Two backends implement it: `RedisSession` keeps each session
//! in a native list, `DynamoDbSession` keeps it in a single table record.
//! Both are feature-gated so hosts only link the client stack they use.

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_wrap,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::similar_names,
    clippy::uninlined_format_args
)]

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
pub mod item;
#[cfg(feature = "redis")]
pub mod redis;
pub mod traits;

pub use item::{ItemError, SessionItem};
pub use traits::Session;

#[cfg(feature = "dynamodb")]
pub use self::dynamodb::{create_table_if_not_exists, DynamoDbSession};
#[cfg(feature = "redis")]
pub use self::redis::{RedisSession, DEFAULT_KEY_PREFIX};
