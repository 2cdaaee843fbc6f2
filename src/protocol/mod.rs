//! Wire protocol: framing, decoding, encoding and checksums.
//!
//! ## Frame Structure
//!
//! v2: `0xFD len incompat compat seq sysid compid msgid[3] payload crc[2]`
//!
//! v1: `0xFE len seq sysid compid msgid payload crc[2]`
//!
//! All multi-byte fields are little-endian. The checksum covers everything
//! between the start byte and the checksum itself.

pub mod assembler;
pub mod buffer;
pub mod crc;
pub mod decoder;
pub mod encoder;

pub use assembler::FrameAssembler;
pub use buffer::RawBuffer;
pub use decoder::{ATTITUDE_PAYLOAD_LEN, MessageDecoder, MessageKind, parse_attitude};
pub use encoder::{CommandEncoder, SequenceCounter};
