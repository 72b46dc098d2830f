//! The command sum (spec.md §3), split by party so that a broker-only tag
//! on an outbound command, or vice versa, cannot be constructed at all —
//! the systems-language answer to the source's conditional-type coupling
//! (spec.md §9).
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecipientCommand {
    New { rcv_pub_key: Vec<u8> },
    Sub,
    Key { snd_pub_key: Vec<u8> },
    Ack,
    Off,
    Del,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SenderCommand {
    Send { msg_body: Vec<u8> },
    Ping,
}

/// A command a client may send (recipient- or sender-rooted).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientCommand {
    Recipient(RecipientCommand),
    Sender(SenderCommand),
}

impl ClientCommand {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Recipient(RecipientCommand::New { .. }) => "NEW",
            Self::Recipient(RecipientCommand::Sub) => "SUB",
            Self::Recipient(RecipientCommand::Key { .. }) => "KEY",
            Self::Recipient(RecipientCommand::Ack) => "ACK",
            Self::Recipient(RecipientCommand::Off) => "OFF",
            Self::Recipient(RecipientCommand::Del) => "DEL",
            Self::Sender(SenderCommand::Send { .. }) => "SEND",
            Self::Sender(SenderCommand::Ping) => "PING",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BrokerCommand {
    Ids { rcv_id: Vec<u8>, snd_id: Vec<u8> },
    Msg { msg_id: Vec<u8>, ts: DateTime<Utc>, msg_body: Vec<u8> },
    End,
    Ok,
    Pong,
    Err { error: crate::error::SMPError },
}

impl BrokerCommand {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ids { .. } => "IDS",
            Self::Msg { .. } => "MSG",
            Self::End => "END",
            Self::Ok => "OK",
            Self::Pong => "PONG",
            Self::Err { .. } => "ERR",
        }
    }

    /// Whether this tag's wire form carries a `queueId` (spec.md §4.4's
    /// `CMD(HAS_AUTH)`/`CMD(NO_QUEUE)` discipline: `IDS` and `PONG` must
    /// NOT carry one, every other broker tag except `ERR` must).
    pub fn requires_empty_queue_id(&self) -> bool {
        matches!(self, Self::Ids { .. } | Self::Pong)
    }
}
