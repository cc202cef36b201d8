//! Domain models for the fever-dose system.

mod dosage;
mod product;

pub use dosage::*;
pub use product::*;

#[cfg(test)]
pub(crate) use product::fixtures;
