/// WebSocket Message Protocol
///
/// JSON frames exchanged with editor clients, tagged by `type`.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::document::access::Permission;

/// Messages sent from the client to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Authenticate the connection with an access token
    #[serde(rename_all = "camelCase")]
    Auth { token: String },

    /// Enter a document room to receive its edits
    #[serde(rename_all = "camelCase")]
    JoinDocument { document_id: Uuid },

    #[serde(rename_all = "camelCase")]
    LeaveDocument { document_id: Uuid },

    /// Opaque editor delta, relayed as-is
    #[serde(rename_all = "camelCase")]
    Edit { document_id: Uuid, payload: serde_json::Value },

    /// Opaque cursor/selection state, relayed as-is
    #[serde(rename_all = "camelCase")]
    Cursor { document_id: Uuid, payload: serde_json::Value },

    Ping,
}

/// Messages sent from the server to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user_id: Uuid },

    #[serde(rename_all = "camelCase")]
    AuthFailed { reason: String },

    /// Reply to a successful join
    #[serde(rename_all = "camelCase")]
    Joined { document_id: Uuid, can_edit: bool },

    #[serde(rename_all = "camelCase")]
    UserJoined { document_id: Uuid, user_id: Uuid },

    #[serde(rename_all = "camelCase")]
    UserLeft { document_id: Uuid, user_id: Uuid },

    #[serde(rename_all = "camelCase")]
    Edit { document_id: Uuid, user_id: Uuid, payload: serde_json::Value },

    #[serde(rename_all = "camelCase")]
    Cursor { document_id: Uuid, user_id: Uuid, payload: serde_json::Value },

    /// The stored bytes were replaced through the HTTP API
    #[serde(rename_all = "camelCase")]
    DocumentSaved { document_id: Uuid, user_id: Uuid, size: i64 },

    /// Sent to the recipient of a new or updated share
    #[serde(rename_all = "camelCase")]
    DocumentShared { document_id: Uuid, permission: Permission },

    /// Write access in a joined room changed
    #[serde(rename_all = "camelCase")]
    AccessChanged { document_id: Uuid, can_edit: bool },

    /// Removed from a room: share revoked or document deleted
    #[serde(rename_all = "camelCase")]
    AccessRevoked { document_id: Uuid },

    Pong,

    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_client_auth_deserialize() {
        let json = r#"{"type":"auth","token":"my-jwt-token"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Auth { token } if token == "my-jwt-token"));
    }

    #[test]
    fn test_client_join_and_leave_deserialize() {
        let id = Uuid::now_v7();
        let json = format!(r#"{{"type":"joinDocument","documentId":"{}"}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(msg, ClientMessage::JoinDocument { document_id } if document_id == id));

        let json = format!(r#"{{"type":"leaveDocument","documentId":"{}"}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(msg, ClientMessage::LeaveDocument { document_id } if document_id == id));
    }

    #[test]
    fn test_client_edit_keeps_payload_opaque() {
        let id = Uuid::now_v7();
        let json = format!(
            r#"{{"type":"edit","documentId":"{}","payload":{{"ops":[{{"insert":"hi"}}],"rev":3}}}}"#,
            id
        );
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        match msg {
            ClientMessage::Edit { document_id, payload } => {
                assert_eq!(document_id, id);
                assert_eq!(payload["ops"][0]["insert"], "hi");
                assert_eq!(payload["rev"], 3);
            }
            _ => panic!("Expected Edit variant"),
        }
    }

    #[test]
    fn test_client_cursor_accepts_any_payload() {
        let id = Uuid::now_v7();
        let json = format!(r#"{{"type":"cursor","documentId":"{}","payload":42}}"#, id);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(msg, ClientMessage::Cursor { payload, .. } if payload == 42));
    }

    #[test]
    fn test_client_ping_deserialize() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_invalid_messages_are_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"unknownType"}"#).is_err());
        // edit without payload
        let json = r#"{"type":"edit","documentId":"550e8400-e29b-41d4-a716-446655440000"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"joinDocument","documentId":"nope"}"#)
            .is_err());
    }

    #[test]
    fn test_server_joined_serialize() {
        let id = Uuid::now_v7();
        let json = serde_json::to_value(ServerMessage::Joined { document_id: id, can_edit: false })
            .unwrap();
        assert_eq!(json["type"], "joined");
        assert_eq!(json["documentId"], id.to_string());
        assert_eq!(json["canEdit"], false);
    }

    #[test]
    fn test_server_edit_serialize() {
        let doc = Uuid::now_v7();
        let user = Uuid::now_v7();
        let msg = ServerMessage::Edit {
            document_id: doc,
            user_id: user,
            payload: serde_json::json!({"ops": []}),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "edit");
        assert_eq!(json["userId"], user.to_string());
        assert_eq!(json["payload"], serde_json::json!({"ops": []}));
    }

    #[test]
    fn test_server_document_events_serialize() {
        let doc = Uuid::now_v7();
        let saved = serde_json::to_value(ServerMessage::DocumentSaved {
            document_id: doc,
            user_id: Uuid::now_v7(),
            size: 128,
        })
        .unwrap();
        assert_eq!(saved["type"], "documentSaved");
        assert_eq!(saved["size"], 128);

        let shared = serde_json::to_value(ServerMessage::DocumentShared {
            document_id: doc,
            permission: Permission::Edit,
        })
        .unwrap();
        assert_eq!(shared["type"], "documentShared");
        assert_eq!(shared["permission"], "edit");

        let changed =
            serde_json::to_value(ServerMessage::AccessChanged { document_id: doc, can_edit: false })
                .unwrap();
        assert_eq!(changed["type"], "accessChanged");
        assert_eq!(changed["canEdit"], false);

        let revoked =
            serde_json::to_value(ServerMessage::AccessRevoked { document_id: doc }).unwrap();
        assert_eq!(revoked["type"], "accessRevoked");
        assert_eq!(revoked["documentId"], doc.to_string());
    }

    #[test]
    fn test_server_pong_serialize() {
        assert_eq!(serde_json::to_string(&ServerMessage::Pong).unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_server_error_serialize() {
        let msg = ServerMessage::Error { message: "Not joined".to_string() };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("Not joined"));
    }
}
