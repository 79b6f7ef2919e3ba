//! Deciding which images are compared, and what happens after each verdict.

mod appraisal;
mod comparator;
mod pairing;

pub use appraisal::Appraiser;
pub use comparator::Comparator;
pub use pairing::{Erased, Pairing};
