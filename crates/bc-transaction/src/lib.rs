/// Minimal Bitcoin-family transaction support for SPV evidence handling.
///
/// Provides the transaction wire codec (parse, serialize, txid), input and
/// output types with opaque scripts, and the per-byte fee quote the payment
/// verifier consumes. Script interpretation and signing are out of scope.

pub mod fee_quote;
pub mod input;
pub mod output;
pub mod transaction;

mod error;
pub use error::TransactionError;
pub use fee_quote::FeeQuote;
pub use input::TransactionInput;
pub use output::TransactionOutput;
pub use transaction::Transaction;
