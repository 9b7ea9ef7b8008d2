//! Market data provider implementations.

pub mod fixture;
pub mod yahoo;

pub use fixture::{FixtureEntry, FixtureProvider};
pub use yahoo::YahooProvider;
