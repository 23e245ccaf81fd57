mod field;
mod packet_builder;

pub use field::{CaptureField, RecordLayout};
pub use packet_builder::{FieldError, Packet};
