// Hash computations
mod cryptographic;
pub mod perceptual;

// Fingerprint stage
pub mod fingerprint;

// Expose cryptographic hash calculations
pub use cryptographic::compute_cryptographic;

// Expose perceptual hash
pub use perceptual::{calculate_phash, PHash};

pub use fingerprint::{fingerprint, HashingOracle, ImageFingerprinter};
