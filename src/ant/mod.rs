pub mod commands;
pub mod pages;
pub mod profile;
pub mod transport;

pub use commands::{build_time_command, build_time_command_at, build_time_command_in, TimeCommand};
pub use pages::{decode_page, DecodeOutcome, Page};
pub use profile::Payload;
pub use transport::{
    ChannelConfig, ChannelId, ChannelMode, SendCallback, Transport, TransportError,
};
