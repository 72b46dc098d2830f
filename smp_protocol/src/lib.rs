#![forbid(unsafe_code)]
//! Wire codec (C4) and encrypted transport (C5) for the Simplex Messaging
//! Protocol.
pub mod codec;
pub mod command;
pub mod error;
pub mod frames;
pub mod party;
pub mod server;
pub mod session;
pub mod transmission;
pub mod transport;

pub use codec::{parse_any, serialize_broker, serialize_client, AnyCommand};
pub use command::{BrokerCommand, ClientCommand, RecipientCommand, SenderCommand};
pub use error::{CmdSub, SMPError};
pub use frames::{split as split_stream_frames, FrameReader, FrameWriter, Frames, StreamFrames};
pub use party::Party;
pub use server::SMPServer;
pub use session::{SessionKey, THandle};
pub use transmission::{BrokerTransmission, ClientTransmission};
pub use transport::{
    EncryptedTransport, TransportReader, TransportWriter,
    CURRENT_SMP_VERSION, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
