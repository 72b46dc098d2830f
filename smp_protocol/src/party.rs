/// Tags a command by who may issue it (spec.md §3).
///
/// Grounded in *style* on `fe2o3_shield`'s handshake message types, which
/// also split an otherwise single request/response sum by role — this
/// crate splits the commands into [`crate::command::RecipientCommand`],
/// [`crate::command::SenderCommand`] and [`crate::command::BrokerCommand`]
/// instead of carrying `Party` on a single generic command type, so that a
/// broker-only tag on a client command is unrepresentable rather than a
/// runtime check (spec.md §9's "type-level party/command coupling" note).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Party {
    Recipient,
    Sender,
    Broker,
}
