/// WebSocket Session Actor
///
/// One actor per connection. It holds the authenticated user and the rooms
/// this connection joined, and writes JSON to the client through the mpsc
/// channel bridged in handler.rs.
///
/// Database checks run with `ctx.spawn()` + `into_actor()`.
use actix::prelude::*;
use actix_web::web;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::document::repository_pg::DocumentRepositoryPg;
use crate::modules::document::service::DocumentService;
use crate::modules::user::repository_pg::UserRepositoryPg;
use crate::modules::user::service::UserService;

use super::events::*;
use super::message::{ClientMessage, ServerMessage};
use super::server::WebSocketServer;

pub type DocumentSvc = DocumentService<DocumentRepositoryPg, UserRepositoryPg>;

pub struct WebSocketSession {
    pub id: Uuid,

    /// Set once the access token has been accepted
    pub user_id: Option<Uuid>,

    pub server: Addr<WebSocketServer>,

    pub tx: mpsc::UnboundedSender<String>,

    /// document_id -> may edit
    pub joined: HashMap<Uuid, bool>,

    /// None in tests
    pub document_service: Option<web::Data<DocumentSvc>>,
    pub user_service: Option<web::Data<UserService>>,
}

impl WebSocketSession {
    pub fn new(
        server: Addr<WebSocketServer>,
        tx: mpsc::UnboundedSender<String>,
        document_service: web::Data<DocumentSvc>,
        user_service: web::Data<UserService>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: None,
            server,
            tx,
            joined: HashMap::new(),
            document_service: Some(document_service),
            user_service: Some(user_service),
        }
    }

    fn send_to_client(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!("Failed to queue message for session {}: {}", self.id, e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize ServerMessage (session {}): {}", self.id, e);
            }
        }
    }

    fn send_error(&self, message: &str) {
        self.send_to_client(&ServerMessage::Error { message: message.to_string() });
    }

    fn require_auth(&self) -> Option<Uuid> {
        if self.user_id.is_none() {
            self.send_error("Authentication required");
            tracing::warn!("Session {} is not authenticated, request rejected", self.id);
        }
        self.user_id
    }

    fn handle_client_message(&mut self, msg: ClientMessage, ctx: &mut Context<Self>) {
        match msg {
            ClientMessage::Auth { token } => self.handle_auth(&token, ctx),

            ClientMessage::JoinDocument { document_id } => self.handle_join(document_id, ctx),

            ClientMessage::LeaveDocument { document_id } => self.handle_leave(document_id),

            ClientMessage::Edit { document_id, payload } => self.handle_edit(document_id, payload),

            ClientMessage::Cursor { document_id, payload } => {
                self.handle_cursor(document_id, payload)
            }

            ClientMessage::Ping => self.send_to_client(&ServerMessage::Pong),
        }
    }

    fn handle_auth(&mut self, token: &str, ctx: &mut Context<Self>) {
        if self.user_id.is_some() {
            self.send_error("Session already authenticated");
            return;
        }

        let Some(user_service) = self.user_service.clone() else {
            self.send_to_client(&ServerMessage::AuthFailed {
                reason: "Authentication unavailable".to_string(),
            });
            return;
        };

        let token = token.to_string();
        ctx.spawn(async move { user_service.authenticate(&token).await }.into_actor(self).map(
            move |result, act, _ctx| match result {
                Ok(claims) => act.complete_auth(claims.sub),
                Err(error::SystemError::Unauthorized(reason)) => {
                    tracing::warn!("Token rejected (session {}): {}", act.id, reason);
                    act.send_to_client(&ServerMessage::AuthFailed { reason: reason.into_owned() });
                }
                Err(e) => {
                    tracing::error!("Token check failed (session {}): {:?}", act.id, e);
                    act.send_to_client(&ServerMessage::AuthFailed {
                        reason: "Authentication unavailable".to_string(),
                    });
                }
            },
        ));
    }

    fn complete_auth(&mut self, user_id: Uuid) {
        self.user_id = Some(user_id);
        self.server.do_send(Authenticate { session_id: self.id, user_id });
        self.send_to_client(&ServerMessage::AuthSuccess { user_id });
        tracing::info!("User {} authenticated on session {}", user_id, self.id);
    }

    /// Read permission is checked against the database on every join.
    fn handle_join(&mut self, document_id: Uuid, ctx: &mut Context<Self>) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        let Some(service) = self.document_service.clone() else {
            self.send_error("Document service unavailable");
            return;
        };

        ctx.spawn(async move { service.access(user_id, document_id).await }.into_actor(self).map(
            move |result, act, _ctx| match result {
                Ok((_, access)) if access.can_read() => {
                    let can_edit = access.can_write();
                    act.joined.insert(document_id, can_edit);
                    act.server.do_send(JoinDocument {
                        session_id: act.id,
                        user_id,
                        document_id,
                        can_edit,
                    });
                    act.send_to_client(&ServerMessage::Joined { document_id, can_edit });
                }
                Ok(_) => act.send_error("You don't have permission to access this document"),
                Err(e) => {
                    tracing::debug!("Join of {} refused for session {}: {:?}", document_id, act.id, e);
                    act.send_error("Document not found");
                }
            },
        ));
    }

    fn handle_leave(&mut self, document_id: Uuid) {
        if self.require_auth().is_none() {
            return;
        }

        if self.joined.remove(&document_id).is_some() {
            self.server.do_send(LeaveDocument { session_id: self.id, document_id });
        }
    }

    /// The server re-checks against its own room state before relaying.
    fn handle_edit(&self, document_id: Uuid, payload: serde_json::Value) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        match self.joined.get(&document_id) {
            Some(true) => self.server.do_send(Relay {
                session_id: self.id,
                document_id,
                message: ServerMessage::Edit { document_id, user_id, payload },
                requires_edit: true,
            }),
            Some(false) => self.send_error("You don't have permission to edit this document"),
            None => self.send_error("Join the document first"),
        }
    }

    fn handle_cursor(&self, document_id: Uuid, payload: serde_json::Value) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        if !self.joined.contains_key(&document_id) {
            self.send_error("Join the document first");
            return;
        }

        self.server.do_send(Relay {
            session_id: self.id,
            document_id,
            message: ServerMessage::Cursor { document_id, user_id, payload },
            requires_edit: false,
        });
    }

    /// Keeps `joined` in step with access changes pushed by the server.
    fn apply_server_message(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::AccessChanged { document_id, can_edit } => {
                if let Some(entry) = self.joined.get_mut(document_id) {
                    *entry = *can_edit;
                }
            }
            ServerMessage::AccessRevoked { document_id } => {
                self.joined.remove(document_id);
            }
            _ => {}
        }
    }
}

impl Actor for WebSocketSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("WebSocket session started: {}", self.id);
        self.server.do_send(Connect { id: self.id, addr: ctx.address() });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("WebSocket session stopped: {}", self.id);
        self.server.do_send(Disconnect { id: self.id });
    }
}

impl Message for ClientMessage {
    type Result = ();
}

impl Handler<ClientMessage> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, ctx: &mut Context<Self>) {
        self.handle_client_message(msg, ctx);
    }
}

impl Handler<CloseSession> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, _: CloseSession, ctx: &mut Context<Self>) {
        ctx.stop();
    }
}

impl Handler<ServerMessage> for WebSocketSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.apply_server_message(&msg);
        self.send_to_client(&msg);
    }
}
