/// Hashing and binary-encoding primitives shared by the bc crates.
///
/// Provides the SHA-256 wrappers, the 32-byte chain-hash type with its
/// reversed-hex display convention, the Bitcoin variable-length integer,
/// and cursor-based binary readers/writers.

pub mod chainhash;
pub mod hash;
pub mod util;

mod error;
pub use error::PrimitivesError;
