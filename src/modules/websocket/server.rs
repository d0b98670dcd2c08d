/// WebSocket Server Actor
///
/// Owns every live connection and the document rooms. Rooms are keyed by
/// document id and hold session ids, so one user with two tabs open on the
/// same document is two room members.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::modules::document::access::Permission;

use super::events::*;
use super::message::ServerMessage;
use super::session::WebSocketSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Member {
    user_id: Uuid,
    can_edit: bool,
}

/// Room membership without any actor plumbing.
#[derive(Debug, Default)]
pub struct Rooms {
    /// document_id -> (session_id -> member)
    rooms: HashMap<Uuid, HashMap<Uuid, Member>>,
}

impl Rooms {
    fn user_present(&self, document_id: &Uuid, user_id: &Uuid) -> bool {
        self.rooms
            .get(document_id)
            .is_some_and(|members| members.values().any(|m| m.user_id == *user_id))
    }

    /// Returns true when this is the user's first session in the room.
    pub fn join(
        &mut self,
        document_id: Uuid,
        session_id: Uuid,
        user_id: Uuid,
        can_edit: bool,
    ) -> bool {
        let first = !self.user_present(&document_id, &user_id);
        self.rooms.entry(document_id).or_default().insert(session_id, Member { user_id, can_edit });
        first
    }

    /// Returns the leaving user and whether they have no session left in
    /// the room.
    pub fn leave(&mut self, document_id: &Uuid, session_id: &Uuid) -> Option<(Uuid, bool)> {
        let members = self.rooms.get_mut(document_id)?;
        let user_id = members.remove(session_id)?.user_id;
        let gone = !members.values().any(|m| m.user_id == user_id);
        if members.is_empty() {
            self.rooms.remove(document_id);
        }
        Some((user_id, gone))
    }

    /// Removes the session from every room: (document_id, user_id, gone).
    pub fn leave_all(&mut self, session_id: &Uuid) -> Vec<(Uuid, Uuid, bool)> {
        let documents: Vec<Uuid> = self
            .rooms
            .iter()
            .filter(|(_, members)| members.contains_key(session_id))
            .map(|(document_id, _)| *document_id)
            .collect();

        documents
            .into_iter()
            .filter_map(|document_id| {
                self.leave(&document_id, session_id).map(|(user_id, gone)| (document_id, user_id, gone))
            })
            .collect()
    }

    /// None when the session is not in the room.
    pub fn can_edit(&self, document_id: &Uuid, session_id: &Uuid) -> Option<bool> {
        self.rooms.get(document_id)?.get(session_id).map(|m| m.can_edit)
    }

    /// Updates every session of the user in the room, returning them.
    pub fn set_can_edit(
        &mut self,
        document_id: &Uuid,
        user_id: &Uuid,
        can_edit: bool,
    ) -> Vec<Uuid> {
        let Some(members) = self.rooms.get_mut(document_id) else {
            return Vec::new();
        };

        members
            .iter_mut()
            .filter(|(_, m)| m.user_id == *user_id)
            .map(|(session_id, m)| {
                m.can_edit = can_edit;
                *session_id
            })
            .collect()
    }

    /// Drops every session of the user from the room, returning them.
    pub fn evict_user(&mut self, document_id: &Uuid, user_id: &Uuid) -> Vec<Uuid> {
        let Some(members) = self.rooms.get_mut(document_id) else {
            return Vec::new();
        };

        let evicted: Vec<Uuid> = members
            .iter()
            .filter(|(_, m)| m.user_id == *user_id)
            .map(|(session_id, _)| *session_id)
            .collect();
        for session_id in &evicted {
            members.remove(session_id);
        }
        if members.is_empty() {
            self.rooms.remove(document_id);
        }
        evicted
    }

    /// Removes the room, returning the sessions it held.
    pub fn close(&mut self, document_id: &Uuid) -> Vec<Uuid> {
        self.rooms
            .remove(document_id)
            .map(|members| members.into_keys().collect())
            .unwrap_or_default()
    }

    pub fn recipients(&self, document_id: &Uuid, skip_session_id: Option<Uuid>) -> Vec<Uuid> {
        self.rooms
            .get(document_id)
            .map(|members| {
                members.keys().filter(|id| Some(**id) != skip_session_id).copied().collect()
            })
            .unwrap_or_default()
    }

    pub fn size(&self, document_id: &Uuid) -> usize {
        self.rooms.get(document_id).map_or(0, HashMap::len)
    }
}

pub struct WebSocketServer {
    /// session_id -> session actor address
    sessions: HashMap<Uuid, Addr<WebSocketSession>>,

    /// user_id -> session ids, a user may be connected from several tabs
    users: HashMap<Uuid, HashSet<Uuid>>,

    rooms: Rooms,
}

impl WebSocketServer {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), users: HashMap::new(), rooms: Rooms::default() }
    }

    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }

    fn send_to_user(&self, user_id: &Uuid, message: &ServerMessage) -> usize {
        let Some(session_ids) = self.users.get(user_id) else {
            return 0;
        };
        for session_id in session_ids {
            self.send_to_session(session_id, message.clone());
        }
        session_ids.len()
    }

    fn broadcast(&self, document_id: &Uuid, message: ServerMessage, skip: Option<Uuid>) -> usize {
        let recipients = self.rooms.recipients(document_id, skip);
        for session_id in &recipients {
            self.send_to_session(session_id, message.clone());
        }
        recipients.len()
    }
}

impl Actor for WebSocketServer {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("WebSocket server started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("WebSocket server stopped");
    }
}

impl Handler<Connect> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("New WebSocket session connected: {}", msg.id);
        self.sessions.insert(msg.id, msg.addr);
    }
}

impl Handler<Disconnect> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("WebSocket session disconnected: {}", msg.id);
        self.sessions.remove(&msg.id);

        self.users.retain(|_, sessions| {
            sessions.remove(&msg.id);
            !sessions.is_empty()
        });

        for (document_id, user_id, gone) in self.rooms.leave_all(&msg.id) {
            if gone {
                self.broadcast(&document_id, ServerMessage::UserLeft { document_id, user_id }, None);
            }
            tracing::debug!(
                "Session {} dropped from document {} ({} remaining)",
                msg.id,
                document_id,
                self.rooms.size(&document_id)
            );
        }
    }
}

impl Handler<Authenticate> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Authenticate, _: &mut Context<Self>) {
        let sessions = self.users.entry(msg.user_id).or_default();
        sessions.insert(msg.session_id);

        tracing::info!("User {} now has {} active session(s)", msg.user_id, sessions.len());
    }
}

impl Handler<JoinDocument> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: JoinDocument, _: &mut Context<Self>) {
        let first = self.rooms.join(msg.document_id, msg.session_id, msg.user_id, msg.can_edit);

        if first {
            self.broadcast(
                &msg.document_id,
                ServerMessage::UserJoined { document_id: msg.document_id, user_id: msg.user_id },
                Some(msg.session_id),
            );
        }

        tracing::info!(
            "User {} joined document {} ({} sessions in room)",
            msg.user_id,
            msg.document_id,
            self.rooms.size(&msg.document_id)
        );
    }
}

impl Handler<LeaveDocument> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: LeaveDocument, _: &mut Context<Self>) {
        let Some((user_id, gone)) = self.rooms.leave(&msg.document_id, &msg.session_id) else {
            return;
        };

        if gone {
            self.broadcast(
                &msg.document_id,
                ServerMessage::UserLeft { document_id: msg.document_id, user_id },
                None,
            );
        }

        tracing::debug!(
            "User {} left document {} ({} remaining)",
            user_id,
            msg.document_id,
            self.rooms.size(&msg.document_id)
        );
    }
}

impl Handler<BroadcastToRoom> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: BroadcastToRoom, _: &mut Context<Self>) {
        let sent = self.broadcast(&msg.document_id, msg.message, None);
        tracing::debug!("Broadcast to document {}: sent to {} sessions", msg.document_id, sent);
    }
}

impl Handler<Relay> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: Relay, _: &mut Context<Self>) {
        let refusal = match self.rooms.can_edit(&msg.document_id, &msg.session_id) {
            None => Some("Join the document first"),
            Some(false) if msg.requires_edit => {
                Some("You don't have permission to edit this document")
            }
            Some(_) => None,
        };

        if let Some(reason) = refusal {
            tracing::debug!(
                "Relay from session {} to document {} refused: {}",
                msg.session_id,
                msg.document_id,
                reason
            );
            let message = ServerMessage::Error { message: reason.to_string() };
            self.send_to_session(&msg.session_id, message);
            return;
        }

        self.broadcast(&msg.document_id, msg.message, Some(msg.session_id));
    }
}

impl Handler<ShareChanged> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: ShareChanged, _: &mut Context<Self>) {
        let ShareChanged { document_id, user_id, permission } = msg;
        let sent =
            self.send_to_user(&user_id, &ServerMessage::DocumentShared { document_id, permission });
        tracing::debug!("Share of {} notified to user {} ({} sessions)", document_id, user_id, sent);

        let can_edit = permission == Permission::Edit;
        for session_id in self.rooms.set_can_edit(&document_id, &user_id, can_edit) {
            let message = ServerMessage::AccessChanged { document_id, can_edit };
            self.send_to_session(&session_id, message);
        }
    }
}

impl Handler<RevokeAccess> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: RevokeAccess, _: &mut Context<Self>) {
        let RevokeAccess { document_id, user_id } = msg;
        let evicted = self.rooms.evict_user(&document_id, &user_id);
        if evicted.is_empty() {
            return;
        }

        for session_id in &evicted {
            self.send_to_session(session_id, ServerMessage::AccessRevoked { document_id });
        }
        self.broadcast(&document_id, ServerMessage::UserLeft { document_id, user_id }, None);

        tracing::info!(
            "Access of user {} to document {} revoked ({} sessions)",
            user_id,
            document_id,
            evicted.len()
        );
    }
}

impl Handler<CloseRoom> for WebSocketServer {
    type Result = ();

    fn handle(&mut self, msg: CloseRoom, _: &mut Context<Self>) {
        let document_id = msg.document_id;
        for session_id in self.rooms.close(&document_id) {
            self.send_to_session(&session_id, ServerMessage::AccessRevoked { document_id });
        }
        tracing::debug!("Room of document {} closed", document_id);
    }
}

impl Message for ServerMessage {
    type Result = ();
}

impl Default for WebSocketServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_reports_first_session_per_user() {
        let mut rooms = Rooms::default();
        let (doc, user) = (Uuid::now_v7(), Uuid::now_v7());
        let (tab1, tab2) = (Uuid::now_v7(), Uuid::now_v7());

        assert!(rooms.join(doc, tab1, user, true));
        assert!(!rooms.join(doc, tab2, user, true));
        assert_eq!(rooms.size(&doc), 2);
    }

    #[test]
    fn test_recipients_skip_sender_session() {
        let mut rooms = Rooms::default();
        let doc = Uuid::now_v7();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let (s1, s2, s3) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        rooms.join(doc, s1, alice, false);
        rooms.join(doc, s2, bob, false);
        rooms.join(doc, s3, alice, false);

        let mut recipients = rooms.recipients(&doc, Some(s1));
        recipients.sort();
        let mut expected = vec![s2, s3];
        expected.sort();
        assert_eq!(recipients, expected);

        assert_eq!(rooms.recipients(&doc, None).len(), 3);
        assert!(rooms.recipients(&Uuid::now_v7(), None).is_empty());
    }

    #[test]
    fn test_leave_reports_when_user_is_gone() {
        let mut rooms = Rooms::default();
        let (doc, user) = (Uuid::now_v7(), Uuid::now_v7());
        let (tab1, tab2) = (Uuid::now_v7(), Uuid::now_v7());
        rooms.join(doc, tab1, user, true);
        rooms.join(doc, tab2, user, true);

        assert_eq!(rooms.leave(&doc, &tab1), Some((user, false)));
        assert_eq!(rooms.leave(&doc, &tab2), Some((user, true)));
        assert_eq!(rooms.leave(&doc, &tab2), None);
        assert_eq!(rooms.size(&doc), 0);
    }

    #[test]
    fn test_leave_all_covers_every_room() {
        let mut rooms = Rooms::default();
        let (doc_a, doc_b) = (Uuid::now_v7(), Uuid::now_v7());
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let (session, other) = (Uuid::now_v7(), Uuid::now_v7());
        rooms.join(doc_a, session, alice, false);
        rooms.join(doc_b, session, alice, false);
        rooms.join(doc_b, other, bob, false);

        let mut left = rooms.leave_all(&session);
        left.sort();
        let mut expected = vec![(doc_a, alice, true), (doc_b, alice, true)];
        expected.sort();
        assert_eq!(left, expected);

        assert_eq!(rooms.size(&doc_a), 0);
        assert_eq!(rooms.recipients(&doc_b, None), vec![other]);
        assert!(rooms.leave_all(&session).is_empty());
    }

    #[test]
    fn test_set_can_edit_updates_every_session_of_the_user() {
        let mut rooms = Rooms::default();
        let doc = Uuid::now_v7();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let (tab1, tab2, other) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        rooms.join(doc, tab1, bob, true);
        rooms.join(doc, tab2, bob, true);
        rooms.join(doc, other, alice, true);

        let mut changed = rooms.set_can_edit(&doc, &bob, false);
        changed.sort();
        let mut expected = vec![tab1, tab2];
        expected.sort();
        assert_eq!(changed, expected);

        assert_eq!(rooms.can_edit(&doc, &tab1), Some(false));
        assert_eq!(rooms.can_edit(&doc, &other), Some(true));
        assert_eq!(rooms.can_edit(&Uuid::now_v7(), &tab1), None);
        assert!(rooms.set_can_edit(&Uuid::now_v7(), &bob, true).is_empty());
    }

    #[test]
    fn test_evict_user_keeps_other_members() {
        let mut rooms = Rooms::default();
        let doc = Uuid::now_v7();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let (tab1, tab2, other) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        rooms.join(doc, tab1, bob, false);
        rooms.join(doc, tab2, bob, false);
        rooms.join(doc, other, alice, true);

        assert_eq!(rooms.evict_user(&doc, &bob).len(), 2);
        assert_eq!(rooms.can_edit(&doc, &tab1), None);
        assert_eq!(rooms.recipients(&doc, None), vec![other]);
        assert!(rooms.evict_user(&doc, &bob).is_empty());

        assert_eq!(rooms.evict_user(&doc, &alice), vec![other]);
        assert_eq!(rooms.size(&doc), 0);
    }

    #[test]
    fn test_close_empties_the_room() {
        let mut rooms = Rooms::default();
        let doc = Uuid::now_v7();
        let (s1, s2) = (Uuid::now_v7(), Uuid::now_v7());
        rooms.join(doc, s1, Uuid::now_v7(), true);
        rooms.join(doc, s2, Uuid::now_v7(), false);

        let mut closed = rooms.close(&doc);
        closed.sort();
        let mut expected = vec![s1, s2];
        expected.sort();
        assert_eq!(closed, expected);
        assert_eq!(rooms.size(&doc), 0);
        assert!(rooms.close(&doc).is_empty());
    }
}
