/// Real-time editor relay.
///
/// - Message protocol (ClientMessage & ServerMessage)
/// - Server actor owning connections and document rooms
/// - Session actor per connection
/// - HTTP handler upgrading to WebSocket
pub mod events;
pub mod handler;
pub mod message;
pub mod server;
pub mod session;
