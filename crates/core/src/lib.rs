//! Domain types and pure logic for the legislative-notice collector.
//!
//! Nothing in this crate touches the network or the database: adapters,
//! stores and the refresh pipeline build on these types.

pub mod adapter;
pub mod dates;
pub mod error;
pub mod identity;
pub mod legislation;
pub mod normalize;
pub mod reconcile;
pub mod source;
pub mod text;
pub mod types;
pub mod window;
