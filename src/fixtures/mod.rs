//! Fixtures Module
//!
//! Typed test fixtures stored by the cache and the random generators that
//! produce them.

mod fixture;
mod generator;

pub use fixture::{AddressData, Fixture, ProductData, UserData};
pub use generator::{FixtureSource, RandomFixtures};
