//! Dosage calculation engine.
//!
//! Pipeline per product: Age Gate → Concentration Guard → Single Dose (capped)
//! → mg→mL → Daily Maximum (ingredient ceilings) → Finiteness Guard → Rounding
//!
//! The engine never fails: blocked and broken products come back as
//! [`DosageOutcome::AgeBlock`](crate::models::DosageOutcome::AgeBlock) and
//! [`DosageOutcome::Error`](crate::models::DosageOutcome::Error) results, one
//! per input product.

mod calculator;
mod caps;

pub use calculator::*;
pub use caps::*;
