use lineup_types::{Seat, ServerMessage, SessionId, SessionState};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub session_id: Option<SessionId>,
    pub seat: Option<Seat>,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            session_id: None,
            seat: None,
            connected_at: now,
            last_activity: now,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn set_session(&mut self, session_id: Option<SessionId>) {
        self.session_id = session_id;
        if session_id.is_none() {
            self.seat = None;
        }
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, conn);
        }

        receiver
    }

    pub async fn remove_connection(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        connections.remove(&id);
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections.get(&id).cloned()
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_session(&self, session_id: SessionId, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.session_id == Some(session_id) {
                let _ = connection.send_message(message.clone());
            }
        }
    }

    /// Pushes a state update to everyone watching the session. Each seated
    /// connection gets its own masked view; spectators get neither secret.
    pub async fn send_session_state(&self, session_id: SessionId, state: &SessionState) {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            if connection.session_id != Some(session_id) {
                continue;
            }
            let view = match connection.seat {
                Some(seat) => state.masked_for_seat(seat),
                None => state.spectator_view(),
            };
            let _ = connection.send_message(ServerMessage::SessionUpdate { state: view });
        }
    }

    pub async fn set_connection_session(&self, id: ConnectionId, session_id: Option<SessionId>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.set_session(session_id);
        }
    }

    pub async fn set_connection_seat(&self, id: ConnectionId, seat: Seat) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.seat = Some(seat);
        }
    }

    pub async fn cleanup_inactive_connections(&self, timeout: Duration) {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        for connection_id in inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            self.remove_connection(connection_id).await;
        }
    }

    // Test helper
    pub async fn connection_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}
