use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::Response,
};
use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{
    ClientMessage, ErrorMessage, PongMessage, RoomCreatedMessage, RoomJoinedMessage, ServerMessage,
};
use crate::rooms::{ConnectionId, FieldUpdate, RoomEvent};
use crate::AppState;

/// The room this connection is currently subscribed to.
type ActiveRoom = Option<(String, broadcast::Receiver<RoomEvent>)>;

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

/// Handle one WebSocket connection for its whole lifetime.
///
/// One select loop per connection: inbound frames on one side, the active
/// room's fan-out channel on the other. Events tagged with this connection's
/// own id are dropped before they reach the socket, so a client never
/// re-receives its own edit.
async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let connection_id: ConnectionId = Uuid::new_v4();
    let lifecycle = &app_state.lifecycle;
    lifecycle.on_connect(connection_id).await;
    info!("WebSocket connection established: {connection_id}");

    let (mut sender, mut receiver) = socket.split();
    let mut active_room: ActiveRoom = None;

    loop {
        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let msg: ClientMessage = match serde_json::from_str(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                warn!("Unparseable message from {connection_id}: {e}");
                                continue;
                            }
                        };
                        if handle_client_message(msg, connection_id, &app_state, &mut sender, &mut active_room)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary frames and transport pings are ignored
                    Some(Err(e)) => {
                        error!("WebSocket error on {connection_id}: {e}");
                        break;
                    }
                }
            }
            event = next_room_event(&mut active_room) => {
                match event {
                    Ok(event) => {
                        // Sender exclusion: skip our own edits.
                        if event.sender == Some(connection_id) {
                            continue;
                        }
                        if send_message(&mut sender, &event.message).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Connection {connection_id} lagged by {n} broadcasts");
                    }
                    Err(RecvError::Closed) => {
                        // Room deleted while we were still subscribed.
                        active_room = None;
                    }
                }
            }
        }
    }

    lifecycle.on_disconnect(connection_id).await;
    info!("WebSocket connection terminated: {connection_id}");
}

/// Await the next event of the active room, or park forever while no room is
/// joined.
async fn next_room_event(active_room: &mut ActiveRoom) -> Result<RoomEvent, RecvError> {
    match active_room {
        Some((_, rx)) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Dispatch one parsed client message.
///
/// Errors from the room core are reported back to this connection only; the
/// returned `Err` is reserved for a dead socket.
async fn handle_client_message(
    msg: ClientMessage,
    connection_id: ConnectionId,
    app_state: &AppState,
    sender: &mut SplitSink<WebSocket, Message>,
    active_room: &mut ActiveRoom,
) -> Result<(), axum::Error> {
    let lifecycle = &app_state.lifecycle;
    match msg {
        ClientMessage::CreateRoom => {
            match lifecycle.on_create_room(connection_id).await {
                Ok((room_id, rx)) => {
                    switch_room(connection_id, app_state, active_room, room_id.clone(), rx).await;
                    send_message(
                        sender,
                        &ServerMessage::RoomCreated(RoomCreatedMessage { room_id }),
                    )
                    .await?;
                }
                Err(e) => {
                    error!("Room creation failed for {connection_id}: {e}");
                    send_error(sender, &e.to_string()).await?;
                }
            }
        }
        ClientMessage::JoinRoom(join) => {
            match lifecycle.on_join_room(connection_id, &join.room_id).await {
                Ok((snapshot, rx)) => {
                    switch_room(connection_id, app_state, active_room, join.room_id, rx).await;
                    send_message(
                        sender,
                        &ServerMessage::RoomJoined(RoomJoinedMessage {
                            code: snapshot.document,
                            canvas_data: snapshot.annotation_layer,
                            image_url: snapshot.reference_image,
                        }),
                    )
                    .await?;
                }
                Err(e) => {
                    // Failed join: no state change, requester only sees the reason.
                    send_error(sender, &e.to_string()).await?;
                }
            }
        }
        ClientMessage::CodeChange(edit) => {
            if let Err(e) = lifecycle
                .on_edit(connection_id, &edit.room_id, FieldUpdate::Document(edit.code))
                .await
            {
                send_error(sender, &e.to_string()).await?;
            }
        }
        ClientMessage::CanvasChange(edit) => {
            if let Err(e) = lifecycle
                .on_edit(
                    connection_id,
                    &edit.room_id,
                    FieldUpdate::AnnotationLayer(edit.canvas_data),
                )
                .await
            {
                send_error(sender, &e.to_string()).await?;
            }
        }
        ClientMessage::Ping => {
            send_message(
                sender,
                &ServerMessage::Pong(PongMessage {
                    date: Utc::now().to_rfc3339(),
                }),
            )
            .await?;
        }
    }
    Ok(())
}

/// Make `room_id` the connection's active room, leaving the previous one.
///
/// A connection holds at most one live subscription; re-joining the same room
/// only replaces the receiver.
async fn switch_room(
    connection_id: ConnectionId,
    app_state: &AppState,
    active_room: &mut ActiveRoom,
    room_id: String,
    rx: broadcast::Receiver<RoomEvent>,
) {
    if let Some((previous, _)) = active_room.take() {
        if previous != room_id {
            app_state
                .lifecycle
                .on_leave_room(connection_id, &previous)
                .await;
        }
    }
    *active_room = Some((room_id, rx));
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize server message: {e}");
            return Ok(());
        }
    };
    sender.send(Message::Text(text)).await
}

async fn send_error(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &str,
) -> Result<(), axum::Error> {
    send_message(
        sender,
        &ServerMessage::Error(ErrorMessage {
            message: message.to_string(),
        }),
    )
    .await
}
