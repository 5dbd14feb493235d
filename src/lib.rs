#[macro_use]
extern crate serde;

mod ballot;
mod election;
mod error;
mod hash;
mod keys;
mod ledger;
mod merkle;
mod nullifier;
mod proof;
mod serde_hex;
mod voter;

pub use ballot::*;
pub use election::*;
pub use error::*;
pub use hash::*;
pub use keys::*;
pub use ledger::*;
pub use merkle::*;
pub use nullifier::*;
pub use proof::*;
pub use serde_hex::*;
pub use voter::*;
