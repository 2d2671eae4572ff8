//! Core structures, constants and codec primitives for the MED (Multiscale
//! Electrophysiology Data) file format. This crate is the foundation for the
//! `med-in` and `med-out` crates; it can be built either with serialization
//! support, or in a slightly more lightweight manner without it (see features).
#![allow(clippy::derive_partial_eq_without_eq)]
extern crate num;
#[macro_use]
extern crate num_derive;

#[cfg(any(feature = "to_json", feature = "serde"))]
extern crate serde;
#[cfg(feature = "to_json")]
extern crate serde_json;

pub mod align;
pub mod bitconverter;
pub mod cmp;
pub mod codec;
pub mod crc;
pub mod crypto;
pub mod dir_ext;
pub mod enums;
pub mod errors;
pub mod global;
pub mod header_structs;
pub mod layout;
pub mod records;
pub mod settings;
pub mod slice;
pub mod text;
pub mod time;

pub use cmp::{BlockFlags, CmpBlockHeader, ParameterFlags, VdsFlagWord};
pub use enums::*;
pub use errors::MedError;
pub use header_structs::*;
pub use records::*;
pub use settings::MedSettings;
pub use slice::{Contiguon, TimeSlice};
