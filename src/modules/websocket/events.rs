/// WebSocket Actor Events
///
/// Messages exchanged between session actors, HTTP handlers and the server
/// actor.
use actix::prelude::*;
use uuid::Uuid;

use crate::modules::document::access::Permission;

use super::message::ServerMessage;
use super::session::WebSocketSession;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: Uuid,
    pub addr: Addr<WebSocketSession>,
}

/// Also leaves every room the session was in.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Authenticate {
    pub session_id: Uuid,
    pub user_id: Uuid,
}

/// Sent by a session once the join permission check has passed.
#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinDocument {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub can_edit: bool,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveDocument {
    pub session_id: Uuid,
    pub document_id: Uuid,
}

/// Fan out to every session in a document room.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct BroadcastToRoom {
    pub document_id: Uuid,
    pub message: ServerMessage,
}

/// A frame from a room member, forwarded to the other members.
///
/// The server checks membership (and write access when `requires_edit`)
/// against its own room state before relaying.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Relay {
    pub session_id: Uuid,
    pub document_id: Uuid,
    pub message: ServerMessage,
    pub requires_edit: bool,
}

/// A share was created or its permission changed.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ShareChanged {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub permission: Permission,
}

/// The user's share was removed; drops their sessions from the room.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RevokeAccess {
    pub document_id: Uuid,
    pub user_id: Uuid,
}

/// The document was deleted; empties its room.
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseRoom {
    pub document_id: Uuid,
}

/// The socket is gone; stops the session actor.
#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseSession;
