//! Library-level scenarios: lookup, validation, inheritance and search
//! exercised together on scratch catalogs.

pub mod inheritance_tests;
pub mod lookup_tests;
pub mod validation_tests;
