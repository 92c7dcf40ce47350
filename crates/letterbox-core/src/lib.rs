// ABOUTME: Core library for letterbox, containing the User entity and its record codec.
// ABOUTME: This crate defines the on-disk row format shared by every letterbox component.

pub mod model;
pub mod record;

pub use model::User;
pub use record::{CodecError, Record, decode_user, encode_user};
