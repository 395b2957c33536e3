//! Ancestry envelopes and payment verification.
//!
//! An ancestry envelope packages a tip payment transaction with every
//! ancestor needed to anchor it: each ancestor carries its raw bytes and
//! either a merkle proof (anchored) or the parents funding its inputs.
//! [`create`] builds envelopes from injected lookups; [`verify`] consumes
//! them and decides whether the payment is fully proven.

pub mod ancestry;
pub mod create;
pub mod verify;

pub(crate) mod binary;
