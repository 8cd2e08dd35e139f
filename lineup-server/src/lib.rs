use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;

use crate::session_manager::SessionManager;
use crate::upload::{ImageHost, UploadError};
use crate::websocket::ConnectionManager;
use lineup_types::{RosterMember, SessionError, TargetMode};

pub mod config;
pub mod session_manager;
pub mod upload;
pub mod websocket;

#[derive(Deserialize)]
struct CreateSessionRequest {
    player_one_id: Uuid,
    player_two_id: Uuid,
    target_mode: TargetMode,
}

#[derive(Deserialize)]
struct MemberRequest {
    name: String,
    nickname: Option<String>,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    session_manager: Arc<SessionManager>,
    image_host: Arc<Option<ImageHost>>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let session_manager_filter = warp::any().map({
        let session_manager = session_manager.clone();
        move || session_manager.clone()
    });

    let image_host_filter = warp::any().map({
        let image_host = image_host.clone();
        move || image_host.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(session_manager_filter.clone())
        .map(|ws: warp::ws::Ws, conn_mgr, session_mgr| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, session_mgr))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    let list_sessions = warp::path("sessions")
        .and(warp::path::end())
        .and(warp::get())
        .and(session_manager_filter.clone())
        .and_then(handle_list_sessions);

    let create_session = warp::path("sessions")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(session_manager_filter.clone())
        .and_then(handle_create_session);

    // Read-only state, safe for spectators and reconnecting clients
    let session_state = warp::path!("session" / String / "state")
        .and(warp::get())
        .and(session_manager_filter.clone())
        .and_then(handle_session_state);

    let list_roster = warp::path("roster")
        .and(warp::path::end())
        .and(warp::get())
        .and(session_manager_filter.clone())
        .and_then(handle_list_roster);

    let create_member = warp::path("roster")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(session_manager_filter.clone())
        .and_then(handle_create_member);

    let update_member = warp::path!("roster" / String)
        .and(warp::put())
        .and(warp::body::json())
        .and(session_manager_filter.clone())
        .and_then(handle_update_member);

    let delete_member = warp::path!("roster" / String)
        .and(warp::delete())
        .and(session_manager_filter.clone())
        .and_then(handle_delete_member);

    let upload_image = warp::path!("roster" / String / "image")
        .and(warp::post())
        .and(warp::body::content_length_limit(8 * 1024 * 1024))
        .and(warp::body::bytes())
        .and(session_manager_filter.clone())
        .and(image_host_filter.clone())
        .and_then(handle_upload_image);

    let league = warp::path("league")
        .and(warp::path::end())
        .and(warp::get())
        .and(session_manager_filter.clone())
        .and_then(handle_league);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    websocket
        .or(health)
        .or(list_sessions)
        .or(create_session)
        .or(session_state)
        .or(list_roster)
        .or(create_member)
        .or(update_member)
        .or(delete_member)
        .or(upload_image)
        .or(league)
        .with(cors)
        .with(warp::log("lineup"))
}

fn json_error(message: &str, status: warp::http::StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": message })),
        status,
    )
}

fn session_error_reply(error: SessionError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = match &error {
        SessionError::SessionNotFound { .. } | SessionError::MemberNotFound { .. } => {
            warp::http::StatusCode::NOT_FOUND
        }
        SessionError::Internal { .. } => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        _ => warp::http::StatusCode::BAD_REQUEST,
    };
    json_error(&error.to_string(), status)
}

async fn handle_list_sessions(
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let summaries = session_manager.list_sessions().await;
    Ok(warp::reply::with_status(
        warp::reply::json(&summaries),
        warp::http::StatusCode::OK,
    ))
}

async fn handle_create_session(
    request: CreateSessionRequest,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match session_manager
        .create_session(
            request.player_one_id,
            request.player_two_id,
            request.target_mode,
        )
        .await
    {
        Ok(state) => Ok(warp::reply::with_status(
            warp::reply::json(&state),
            warp::http::StatusCode::CREATED,
        )),
        Err(error) => Ok(session_error_reply(error)),
    }
}

async fn handle_session_state(
    session_id: String,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session_uuid = match Uuid::parse_str(&session_id) {
        Ok(uuid) => uuid,
        Err(_) => {
            return Ok(json_error(
                "Invalid session ID format",
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    match session_manager.get_state(session_uuid).await {
        Some(state) => Ok(warp::reply::with_status(
            warp::reply::json(&state.spectator_view()),
            warp::http::StatusCode::OK,
        )),
        None => Ok(json_error(
            "Session not found",
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}

async fn handle_list_roster(
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match session_manager.roster().list().await {
        Ok(members) => Ok(warp::reply::with_status(
            warp::reply::json(&members),
            warp::http::StatusCode::OK,
        )),
        Err(err) => {
            tracing::error!("Failed to list roster: {}", err);
            Ok(json_error(
                "Failed to list roster",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_create_member(
    request: MemberRequest,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if request.name.trim().is_empty() {
        return Ok(json_error(
            "Member name must not be empty",
            warp::http::StatusCode::BAD_REQUEST,
        ));
    }

    let member = RosterMember {
        id: Uuid::new_v4(),
        name: request.name,
        nickname: request.nickname,
        image_url: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    match session_manager.roster().create(member).await {
        Ok(created) => Ok(warp::reply::with_status(
            warp::reply::json(&created),
            warp::http::StatusCode::CREATED,
        )),
        Err(err) => {
            tracing::error!("Failed to create roster member: {}", err);
            Ok(json_error(
                "Failed to create roster member",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_update_member(
    member_id: String,
    request: MemberRequest,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let member_uuid = match Uuid::parse_str(&member_id) {
        Ok(uuid) => uuid,
        Err(_) => {
            return Ok(json_error(
                "Invalid member ID format",
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    if request.name.trim().is_empty() {
        return Ok(json_error(
            "Member name must not be empty",
            warp::http::StatusCode::BAD_REQUEST,
        ));
    }

    match session_manager
        .roster()
        .update_details(member_uuid, request.name, request.nickname)
        .await
    {
        Ok(Some(member)) => Ok(warp::reply::with_status(
            warp::reply::json(&member),
            warp::http::StatusCode::OK,
        )),
        Ok(None) => Ok(json_error(
            "Member not found",
            warp::http::StatusCode::NOT_FOUND,
        )),
        Err(err) => {
            tracing::error!("Failed to update roster member: {}", err);
            Ok(json_error(
                "Failed to update roster member",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_delete_member(
    member_id: String,
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let member_uuid = match Uuid::parse_str(&member_id) {
        Ok(uuid) => uuid,
        Err(_) => {
            return Ok(json_error(
                "Invalid member ID format",
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    match session_manager.roster().delete(member_uuid).await {
        Ok(true) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({ "deleted": true })),
            warp::http::StatusCode::OK,
        )),
        Ok(false) => Ok(json_error(
            "Member not found",
            warp::http::StatusCode::NOT_FOUND,
        )),
        Err(err) => {
            tracing::error!("Failed to delete roster member: {}", err);
            Ok(json_error(
                "Failed to delete roster member",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_upload_image(
    member_id: String,
    body: bytes::Bytes,
    session_manager: Arc<SessionManager>,
    image_host: Arc<Option<ImageHost>>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let member_uuid = match Uuid::parse_str(&member_id) {
        Ok(uuid) => uuid,
        Err(_) => {
            return Ok(json_error(
                "Invalid member ID format",
                warp::http::StatusCode::BAD_REQUEST,
            ));
        }
    };

    let Some(host) = image_host.as_ref() else {
        return Ok(json_error(
            &UploadError::Disabled.to_string(),
            warp::http::StatusCode::SERVICE_UNAVAILABLE,
        ));
    };

    if body.is_empty() {
        return Ok(json_error(
            "Image body must not be empty",
            warp::http::StatusCode::BAD_REQUEST,
        ));
    }

    // Upload first; the database is only touched once the host accepted
    // the image.
    let url = match host.upload(&body).await {
        Ok(url) => url,
        Err(err) => {
            tracing::error!("Image upload failed: {}", err);
            return Ok(json_error(
                "Image upload failed",
                warp::http::StatusCode::BAD_GATEWAY,
            ));
        }
    };

    match session_manager.roster().set_image_url(member_uuid, url).await {
        Ok(Some(member)) => Ok(warp::reply::with_status(
            warp::reply::json(&member),
            warp::http::StatusCode::OK,
        )),
        Ok(None) => Ok(json_error(
            "Member not found",
            warp::http::StatusCode::NOT_FOUND,
        )),
        Err(err) => {
            tracing::error!("Failed to store image url: {}", err);
            Ok(json_error(
                "Failed to store image url",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_league(
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match session_manager
        .stats()
        .league(session_manager.roster())
        .await
    {
        Ok(table) => Ok(warp::reply::with_status(
            warp::reply::json(&table),
            warp::http::StatusCode::OK,
        )),
        Err(err) => {
            tracing::error!("Failed to fetch league table: {}", err);
            Ok(json_error(
                "Failed to fetch league table",
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use lineup_persistence::{RosterRepository, StatsRepository, connect_to_memory_database};
    use lineup_types::{ClientMessage, Seat, ServerMessage, SessionPhase};
    use migration::{Migrator, MigratorTrait};

    async fn create_test_app() -> (
        impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone,
        Arc<SessionManager>,
        RosterRepository,
        StatsRepository,
    ) {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let roster = RosterRepository::new(db.clone());
        let stats = StatsRepository::new(db);

        let connection_manager = Arc::new(ConnectionManager::new());
        let session_manager = Arc::new(SessionManager::new(
            roster.clone(),
            stats.clone(),
            lineup_core::SessionRules::default(),
        ));

        let routes = create_routes(connection_manager, session_manager.clone(), Arc::new(None));

        (routes, session_manager, roster, stats)
    }

    async fn seed_member(roster: &RosterRepository, name: &str) -> RosterMember {
        let member = RosterMember {
            id: Uuid::new_v4(),
            name: name.to_string(),
            nickname: None,
            image_url: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        roster.create(member.clone()).await.unwrap()
    }

    fn parse_server_message(msg: &warp::ws::Message) -> ServerMessage {
        let text = msg.to_str().expect("expected a text frame");
        serde_json::from_str(text).expect("expected a valid ServerMessage")
    }

    async fn send_client_message(ws: &mut warp::test::WsClient, message: &ClientMessage) {
        ws.send_text(serde_json::to_string(message).unwrap()).await;
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _, _, _) = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_invalid_routes() {
        let (app, _, _, _) = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/invalid")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_http_endpoints_cors() {
        let (app, _, _, _) = create_test_app().await;

        let response = warp::test::request()
            .method("OPTIONS")
            .path("/health")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }

    #[tokio::test]
    async fn test_roster_crud_over_http() {
        let (app, _, _, _) = create_test_app().await;

        // Create
        let response = warp::test::request()
            .method("POST")
            .path("/roster")
            .json(&serde_json::json!({ "name": "Ana", "nickname": "The Owl" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 201);
        let created: RosterMember = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(created.name, "Ana");

        // List
        let response = warp::test::request()
            .method("GET")
            .path("/roster")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let members: Vec<RosterMember> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(members.len(), 1);

        // Update
        let response = warp::test::request()
            .method("PUT")
            .path(&format!("/roster/{}", created.id))
            .json(&serde_json::json!({ "name": "Ana Maria" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let updated: RosterMember = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.nickname, None);

        // Delete
        let response = warp::test::request()
            .method("DELETE")
            .path(&format!("/roster/{}", created.id))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);

        let response = warp::test::request()
            .method("DELETE")
            .path(&format!("/roster/{}", created.id))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_create_member_rejects_blank_name() {
        let (app, _, _, _) = create_test_app().await;

        let response = warp::test::request()
            .method("POST")
            .path("/roster")
            .json(&serde_json::json!({ "name": "   " }))
            .reply(&app)
            .await;

        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_create_session_requires_known_members() {
        let (app, _, _, _) = create_test_app().await;

        let response = warp::test::request()
            .method("POST")
            .path("/sessions")
            .json(&serde_json::json!({
                "player_one_id": Uuid::new_v4(),
                "player_two_id": Uuid::new_v4(),
                "target_mode": "Select"
            }))
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_create_and_fetch_session() {
        let (app, _, roster, _) = create_test_app().await;
        let ana = seed_member(&roster, "Ana").await;
        let bruno = seed_member(&roster, "Bruno").await;
        seed_member(&roster, "Clara").await;
        seed_member(&roster, "Dora").await;

        let response = warp::test::request()
            .method("POST")
            .path("/sessions")
            .json(&serde_json::json!({
                "player_one_id": ana.id,
                "player_two_id": bruno.id,
                "target_mode": "Random"
            }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 201);
        let created: lineup_types::SessionState =
            serde_json::from_slice(response.body()).unwrap();
        assert_eq!(created.phase, SessionPhase::Setup);
        assert_eq!(created.player_one_board.len(), 2);

        // Listed newest first
        let response = warp::test::request()
            .method("GET")
            .path("/sessions")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let summaries: Vec<lineup_types::SessionSummary> =
            serde_json::from_slice(response.body()).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, created.id);

        // Spectator state endpoint
        let response = warp::test::request()
            .method("GET")
            .path(&format!("/session/{}/state", created.id))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let state: lineup_types::SessionState =
            serde_json::from_slice(response.body()).unwrap();
        assert_eq!(state.player_one_target_id, None);
        assert_eq!(state.player_two_target_id, None);
    }

    #[tokio::test]
    async fn test_session_state_unknown_session() {
        let (app, _, _, _) = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/session/{}/state", Uuid::new_v4()))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 404);

        let response = warp::test::request()
            .method("GET")
            .path("/session/not-a-uuid/state")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_image_upload_unconfigured() {
        let (app, _, roster, _) = create_test_app().await;
        let ana = seed_member(&roster, "Ana").await;

        let response = warp::test::request()
            .method("POST")
            .path(&format!("/roster/{}/image", ana.id))
            .body(vec![0u8; 16])
            .reply(&app)
            .await;

        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_league_endpoint_lists_all_members() {
        let (app, _, roster, stats) = create_test_app().await;
        let ana = seed_member(&roster, "Ana").await;
        let bruno = seed_member(&roster, "Bruno").await;

        stats.record_result(ana.id, bruno.id, 3).await.unwrap();

        let response = warp::test::request()
            .method("GET")
            .path("/league")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);

        let table: Vec<lineup_persistence::repositories::LeagueEntry> =
            serde_json::from_slice(response.body()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].member.id, ana.id);
        assert_eq!(table[0].points, 4);
        assert_eq!(table[1].points, 1);
    }

    #[tokio::test]
    async fn test_websocket_invalid_message_handling() {
        let (app, _, _, _) = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        ws.send_text("invalid json").await;

        let msg = ws.recv().await.expect("Should receive error reply");
        match parse_server_message(&msg) {
            ServerMessage::Error { message } => {
                assert!(message.contains("Invalid JSON message"));
            }
            other => panic!("Expected error message, got: {:?}", other),
        }

        // The connection survives the bad frame and keeps serving
        send_client_message(
            &mut ws,
            &ClientMessage::JoinSession {
                session_id: Uuid::new_v4().to_string(),
            },
        )
        .await;
        let msg = ws.recv().await.expect("Should receive response");
        assert!(matches!(
            parse_server_message(&msg),
            ServerMessage::ActionRejected {
                error: SessionError::SessionNotFound { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_websocket_heartbeat() {
        let (app, _, _, _) = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        send_client_message(&mut ws, &ClientMessage::Heartbeat).await;

        // Heartbeat generates no response; nothing should error
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    #[tokio::test]
    async fn test_websocket_join_unknown_session() {
        let (app, _, _, _) = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        send_client_message(
            &mut ws,
            &ClientMessage::JoinSession {
                session_id: Uuid::new_v4().to_string(),
            },
        )
        .await;

        let msg = ws.recv().await.expect("Should receive response");
        let server_msg = parse_server_message(&msg);
        assert!(matches!(
            server_msg,
            ServerMessage::ActionRejected {
                error: SessionError::SessionNotFound { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_websocket_commands_require_session() {
        let (app, _, _, _) = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        send_client_message(&mut ws, &ClientMessage::EndTurn).await;

        let msg = ws.recv().await.expect("Should receive response");
        let server_msg = parse_server_message(&msg);
        if let ServerMessage::Error { message } = server_msg {
            assert!(message.contains("Join a session first"));
        } else {
            panic!("Expected error message, got: {:?}", server_msg);
        }
    }

    #[tokio::test]
    async fn test_websocket_session_flow_to_finish() {
        let (app, session_manager, roster, stats) = create_test_app().await;
        let ana = seed_member(&roster, "Ana").await;
        let bruno = seed_member(&roster, "Bruno").await;
        let clara = seed_member(&roster, "Clara").await;
        let dora = seed_member(&roster, "Dora").await;

        let created = session_manager
            .create_session(ana.id, bruno.id, TargetMode::Random)
            .await
            .unwrap();

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        // Join as a spectator first
        send_client_message(
            &mut ws,
            &ClientMessage::JoinSession {
                session_id: created.id.to_string(),
            },
        )
        .await;
        let msg = ws.recv().await.expect("Should receive SessionJoined");
        let server_msg = parse_server_message(&msg);
        let ServerMessage::SessionJoined { state, roster } = server_msg else {
            panic!("Expected SessionJoined, got: {:?}", server_msg);
        };
        assert_eq!(state.phase, SessionPhase::Setup);
        assert_eq!(roster.len(), 4);

        // Claim player one
        send_client_message(
            &mut ws,
            &ClientMessage::ClaimSeat {
                seat: Seat::PlayerOne,
            },
        )
        .await;
        let msg = ws.recv().await.expect("Should receive SeatClaimed");
        assert!(matches!(
            parse_server_message(&msg),
            ServerMessage::SeatClaimed {
                seat: Seat::PlayerOne
            }
        ));
        let msg = ws.recv().await.expect("Should receive SessionUpdate");
        let ServerMessage::SessionUpdate { state } = parse_server_message(&msg) else {
            panic!("Expected SessionUpdate");
        };
        assert!(state.player_one_joined);
        assert_eq!(state.phase, SessionPhase::Setup);

        // The opponent claims their seat out of band; random targets are
        // drawn and play begins.
        session_manager
            .claim_seat(created.id, Seat::PlayerTwo)
            .await
            .unwrap();

        // With only two unseated members the first crossing attempt turns
        // into a final guess proposal.
        send_client_message(&mut ws, &ClientMessage::Eliminate { member_id: clara.id }).await;
        let msg = ws.recv().await.expect("Should receive proposal");
        let ServerMessage::FinalGuessProposed { candidate_id } = parse_server_message(&msg) else {
            panic!("Expected FinalGuessProposed");
        };
        assert_eq!(candidate_id, dora.id);

        // Confirm the actual secret and win.
        let secret = session_manager
            .get_state(created.id)
            .await
            .unwrap()
            .secret_for(Seat::PlayerOne)
            .unwrap();
        send_client_message(&mut ws, &ClientMessage::ConfirmGuess { member_id: secret }).await;

        let msg = ws.recv().await.expect("Should receive SessionFinished");
        let ServerMessage::SessionFinished {
            winner,
            guess_id,
            target_id,
        } = parse_server_message(&msg)
        else {
            panic!("Expected SessionFinished");
        };
        assert_eq!(winner, Seat::PlayerOne);
        assert_eq!(guess_id, secret);
        assert_eq!(target_id, secret);

        let msg = ws.recv().await.expect("Should receive SessionUpdate");
        let ServerMessage::SessionUpdate { state } = parse_server_message(&msg) else {
            panic!("Expected SessionUpdate");
        };
        assert_eq!(state.phase, SessionPhase::Finished);
        assert_eq!(state.winner, Some(Seat::PlayerOne));

        // The result landed in the league.
        let winner_stats = stats.find_by_member(ana.id).await.unwrap();
        assert_eq!(winner_stats.wins, 1);
        let loser_stats = stats.find_by_member(bruno.id).await.unwrap();
        assert_eq!(loser_stats.losses, 1);
    }

    #[tokio::test]
    async fn test_websocket_turn_rejection() {
        let (app, session_manager, roster, _) = create_test_app().await;
        let ana = seed_member(&roster, "Ana").await;
        let bruno = seed_member(&roster, "Bruno").await;
        seed_member(&roster, "Clara").await;
        seed_member(&roster, "Dora").await;
        seed_member(&roster, "Egon").await;

        let created = session_manager
            .create_session(ana.id, bruno.id, TargetMode::Random)
            .await
            .unwrap();

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        send_client_message(
            &mut ws,
            &ClientMessage::JoinSession {
                session_id: created.id.to_string(),
            },
        )
        .await;
        let _joined = ws.recv().await.expect("Should receive SessionJoined");

        send_client_message(
            &mut ws,
            &ClientMessage::ClaimSeat {
                seat: Seat::PlayerTwo,
            },
        )
        .await;
        let _claimed = ws.recv().await.expect("Should receive SeatClaimed");
        let _update = ws.recv().await.expect("Should receive SessionUpdate");

        session_manager
            .claim_seat(created.id, Seat::PlayerOne)
            .await
            .unwrap();

        // Player one opens, so player two acting now is out of turn.
        send_client_message(&mut ws, &ClientMessage::EndTurn).await;
        let msg = ws.recv().await.expect("Should receive rejection");
        assert!(matches!(
            parse_server_message(&msg),
            ServerMessage::ActionRejected {
                error: SessionError::NotYourTurn
            }
        ));
    }
}
