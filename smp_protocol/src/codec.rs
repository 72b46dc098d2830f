//! Command serialization and parsing (spec.md §4.2), built on
//! `smp_core::parse::Parser`. Grounded in the teacher's tag-dispatch idiom
//! (`fe2o3_shield::srv::msg::handshake`'s `msg.add_arg_val`/tagged parsing)
//! translated to plain combinator calls, since this crate carries no
//! `fe2o3_syntax`/`fe2o3_jdat` dependency.
use smp_core::prelude::*;
use smp_core::byte::{from_base64, to_base64};
use smp_core::parse::Parser;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::command::{BrokerCommand, ClientCommand, RecipientCommand, SenderCommand};
use crate::error::{CmdSub, SMPError};
use crate::party::Party;

/// Any one of the 14 wire command variants, spanning all three parties.
/// The client only ever serializes [`ClientCommand`]s and parses
/// [`BrokerCommand`]s, but a single combined type lets the parser (and its
/// round-trip tests) treat tag dispatch uniformly across the whole set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AnyCommand {
    Recipient(RecipientCommand),
    Sender(SenderCommand),
    Broker(BrokerCommand),
}

impl From<ClientCommand> for AnyCommand {
    fn from(c: ClientCommand) -> Self {
        match c {
            ClientCommand::Recipient(r) => Self::Recipient(r),
            ClientCommand::Sender(s) => Self::Sender(s),
        }
    }
}

fn key_blob(key: &[u8]) -> String {
    format!("rsa:{}", to_base64(key))
}

fn parse_key_blob(p: &mut Parser) -> Outcome<Vec<u8>> {
    res!(p.str_tag("rsa:"));
    p.base64_field()
}

pub fn serialize_client(cmd: &ClientCommand) -> Outcome<Vec<u8>> {
    serialize_any(&AnyCommand::from(cmd.clone()))
}

pub fn serialize_broker(cmd: &BrokerCommand) -> Outcome<Vec<u8>> {
    serialize_any(&AnyCommand::Broker(cmd.clone()))
}

pub fn serialize_any(cmd: &AnyCommand) -> Outcome<Vec<u8>> {
    // Message bodies are arbitrary bytes (often already E2E-encrypted),
    // so this builds the wire form directly as bytes rather than through
    // a `String`, which would reject non-UTF-8 content.
    let mut buf: Vec<u8> = Vec::new();
    match cmd {
        AnyCommand::Recipient(RecipientCommand::New { rcv_pub_key }) => {
            buf.extend_from_slice(b"NEW ");
            buf.extend_from_slice(key_blob(rcv_pub_key).as_bytes());
        },
        AnyCommand::Recipient(RecipientCommand::Sub) => buf.extend_from_slice(b"SUB"),
        AnyCommand::Recipient(RecipientCommand::Key { snd_pub_key }) => {
            buf.extend_from_slice(b"KEY ");
            buf.extend_from_slice(key_blob(snd_pub_key).as_bytes());
        },
        AnyCommand::Recipient(RecipientCommand::Ack) => buf.extend_from_slice(b"ACK"),
        AnyCommand::Recipient(RecipientCommand::Off) => buf.extend_from_slice(b"OFF"),
        AnyCommand::Recipient(RecipientCommand::Del) => buf.extend_from_slice(b"DEL"),
        AnyCommand::Sender(SenderCommand::Send { msg_body }) => {
            buf.extend_from_slice(format!("SEND {} ", msg_body.len()).as_bytes());
            buf.extend_from_slice(msg_body);
            buf.push(b' ');
        },
        AnyCommand::Sender(SenderCommand::Ping) => buf.extend_from_slice(b"PING"),
        AnyCommand::Broker(BrokerCommand::Ids { rcv_id, snd_id }) => {
            buf.extend_from_slice(format!("IDS {} {}", to_base64(rcv_id), to_base64(snd_id)).as_bytes());
        },
        AnyCommand::Broker(BrokerCommand::Msg { msg_id, ts, msg_body }) => {
            buf.extend_from_slice(format!(
                "MSG {} {} {} ",
                to_base64(msg_id),
                ts.to_rfc3339_opts(SecondsFormat::Millis, true),
                msg_body.len(),
            ).as_bytes());
            buf.extend_from_slice(msg_body);
            buf.push(b' ');
        },
        AnyCommand::Broker(BrokerCommand::End) => buf.extend_from_slice(b"END"),
        AnyCommand::Broker(BrokerCommand::Ok) => buf.extend_from_slice(b"OK"),
        AnyCommand::Broker(BrokerCommand::Pong) => buf.extend_from_slice(b"PONG"),
        AnyCommand::Broker(BrokerCommand::Err { error: SMPError::Cmd(sub) }) => {
            buf.extend_from_slice(format!("ERR CMD {}", sub.as_str()).as_bytes());
        },
        AnyCommand::Broker(BrokerCommand::Err { error }) => {
            buf.extend_from_slice(format!("ERR {}", error.tag()).as_bytes());
        },
    };
    Ok(buf)
}

/// Tag-dispatched parse across all three parties. Returns the party the
/// matched tag belongs to alongside the parsed command.
pub fn parse_any(p: &mut Parser) -> Outcome<(Party, AnyCommand)> {
    p.attempt(|p| {
        res!(p.str_tag("NEW"));
        res!(p.space());
        let key = res!(parse_key_blob(p));
        Ok((Party::Recipient, AnyCommand::Recipient(RecipientCommand::New { rcv_pub_key: key })))
    })
    .or_else(|_| p.attempt(|p| {
        res!(p.str_tag("KEY"));
        res!(p.space());
        let key = res!(parse_key_blob(p));
        Ok((Party::Recipient, AnyCommand::Recipient(RecipientCommand::Key { snd_pub_key: key })))
    }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("SUB")); Ok((Party::Recipient, AnyCommand::Recipient(RecipientCommand::Sub))) }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("ACK")); Ok((Party::Recipient, AnyCommand::Recipient(RecipientCommand::Ack))) }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("OFF")); Ok((Party::Recipient, AnyCommand::Recipient(RecipientCommand::Off))) }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("DEL")); Ok((Party::Recipient, AnyCommand::Recipient(RecipientCommand::Del))) }))
    .or_else(|_| p.attempt(|p| {
        res!(p.str_tag("SEND"));
        res!(p.space());
        let len = res!(p.decimal()) as usize;
        res!(p.space());
        let body = res!(p.take(len)).to_vec();
        res!(p.space());
        Ok((Party::Sender, AnyCommand::Sender(SenderCommand::Send { msg_body: body })))
    }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("PING")); Ok((Party::Sender, AnyCommand::Sender(SenderCommand::Ping))) }))
    .or_else(|_| p.attempt(|p| {
        res!(p.str_tag("IDS"));
        res!(p.space());
        let rcv_id = res!(p.base64_field());
        res!(p.space());
        let snd_id = res!(p.base64_field());
        Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::Ids { rcv_id, snd_id })))
    }))
    .or_else(|_| p.attempt(|p| {
        res!(p.str_tag("MSG"));
        res!(p.space());
        let msg_id = res!(p.base64_field());
        res!(p.space());
        let ts_token = res!(p.date_token()).to_string();
        let ts = res!(
            DateTime::parse_from_rfc3339(&ts_token);
            Decode, Parse, Invalid
        ).with_timezone(&Utc);
        res!(p.space());
        let len = res!(p.decimal()) as usize;
        res!(p.space());
        let body = res!(p.take(len)).to_vec();
        res!(p.space());
        Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::Msg { msg_id, ts, msg_body: body })))
    }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("END")); Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::End))) }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("OK")); Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::Ok))) }))
    .or_else(|_| p.attempt(|p| { res!(p.str_tag("PONG")); Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::Pong))) }))
    .or_else(|_| p.attempt(|p| {
        res!(p.str_tag("ERR"));
        res!(p.space());
        p.attempt(|p| {
            res!(p.str_tag("CMD"));
            res!(p.space());
            let sub_tag = res!(p.one_of_str(&["PROHIBITED", "KEY_SIZE", "SYNTAX", "NO_AUTH", "HAS_AUTH", "NO_QUEUE"]));
            let sub = res!(CmdSub::from_str(sub_tag));
            Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::Err { error: SMPError::Cmd(sub) })))
        })
        .or_else(|_| p.attempt(|p| {
            let tag = res!(p.one_of_str(&["BLOCK", "AUTH", "NO_MSG", "INTERNAL"]));
            let error = match tag {
                "BLOCK" => SMPError::Block,
                "AUTH" => SMPError::Auth,
                "NO_MSG" => SMPError::NoMsg,
                _ => SMPError::Internal,
            };
            Ok((Party::Broker, AnyCommand::Broker(BrokerCommand::Err { error })))
        }))
    }))
    .map_err(|_| err!(
        "Unrecognised command tag at position {}.", p.pos();
        Parse, Syntax, Invalid
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(cmd: AnyCommand) {
        let wire = serialize_any(&cmd).unwrap();
        let mut p = Parser::new(&wire);
        let (_, parsed) = parse_any(&mut p).unwrap();
        assert!(p.end().is_ok());
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn test_roundtrip_recipient_commands() {
        roundtrip(AnyCommand::Recipient(RecipientCommand::New { rcv_pub_key: b"1234".to_vec() }));
        roundtrip(AnyCommand::Recipient(RecipientCommand::Sub));
        roundtrip(AnyCommand::Recipient(RecipientCommand::Key { snd_pub_key: b"abcd".to_vec() }));
        roundtrip(AnyCommand::Recipient(RecipientCommand::Ack));
        roundtrip(AnyCommand::Recipient(RecipientCommand::Off));
        roundtrip(AnyCommand::Recipient(RecipientCommand::Del));
    }

    #[test]
    fn test_roundtrip_sender_commands() {
        roundtrip(AnyCommand::Sender(SenderCommand::Send { msg_body: b"hello".to_vec() }));
        roundtrip(AnyCommand::Sender(SenderCommand::Ping));
    }

    #[test]
    fn test_roundtrip_broker_commands() {
        roundtrip(AnyCommand::Broker(BrokerCommand::Ids { rcv_id: b"r1".to_vec(), snd_id: b"s1".to_vec() }));
        roundtrip(AnyCommand::Broker(BrokerCommand::Msg {
            msg_id: b"m1".to_vec(),
            // Millisecond-aligned: the wire form only carries millisecond
            // precision, so a sub-millisecond `Utc::now()` would not
            // round-trip byte-for-byte.
            ts: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            msg_body: b"hello".to_vec(),
        }));
        roundtrip(AnyCommand::Broker(BrokerCommand::End));
        roundtrip(AnyCommand::Broker(BrokerCommand::Ok));
        roundtrip(AnyCommand::Broker(BrokerCommand::Pong));
        roundtrip(AnyCommand::Broker(BrokerCommand::Err { error: SMPError::Auth }));
        roundtrip(AnyCommand::Broker(BrokerCommand::Err { error: SMPError::Cmd(CmdSub::Syntax) }));
    }

    #[test]
    fn test_unrecognised_tag_is_syntax_error() {
        let mut p = Parser::new(b"BOGUS");
        assert!(parse_any(&mut p).is_err());
    }
}
