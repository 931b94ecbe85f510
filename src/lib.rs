mod client;
pub mod codec;
mod diff;
mod error;
pub mod fields;
mod logger;
mod model;
pub mod payload;
pub mod protocol;
mod types;

pub use client::{DaikinClient, DaikinClientBuilder};
pub use codec::{Encoding, FieldValue};
pub use error::{DecodeError, Error, FormatError, Result, ValidationError};
pub use fields::{FieldSpec, PayloadClass, Presence};
pub use logger::MessageLogMode;
pub use model::*;
pub use payload::Payload;
pub use protocol::build_set_payload;
pub use types::*;
