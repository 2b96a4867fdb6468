use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomMessage {
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CodeChangeMessage {
    pub room_id: String,
    pub code: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CanvasChangeMessage {
    pub room_id: String,
    #[serde_as(as = "Base64")]
    pub canvas_data: Vec<u8>,
}

/// Messages a client may send over the websocket.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "createRoom")]
    CreateRoom,
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoomMessage),
    #[serde(rename = "code-change")]
    CodeChange(CodeChangeMessage),
    #[serde(rename = "canvas-update")]
    CanvasChange(CanvasChangeMessage),
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedMessage {
    pub room_id: String,
}

/// Full current snapshot of the room, sent to a joiner only.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoinedMessage {
    pub code: String,
    #[serde_as(as = "Option<Base64>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CodeUpdateMessage {
    pub code: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshotMessage {
    #[serde_as(as = "Base64")]
    pub canvas_data: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageMessage {
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMessage {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PongMessage {
    pub date: String,
}

/// Messages the server sends, either to one connection or to all other
/// members of a room.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "roomCreated")]
    RoomCreated(RoomCreatedMessage),
    #[serde(rename = "roomJoined")]
    RoomJoined(RoomJoinedMessage),
    #[serde(rename = "code-update")]
    CodeUpdate(CodeUpdateMessage),
    #[serde(rename = "canvas-update")]
    CanvasUpdate(CanvasSnapshotMessage),
    #[serde(rename = "image")]
    Image(ImageMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
    #[serde(rename = "pong")]
    Pong(PongMessage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse_their_wire_names() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"createRoom"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::CreateRoom));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"joinRoom","roomId":"room-ab12cd34e"}"#).unwrap();
        match msg {
            ClientMessage::JoinRoom(join) => assert_eq!(join.room_id, "room-ab12cd34e"),
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"code-change","roomId":"room-ab12cd34e","code":"<h1>hi</h1>"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::CodeChange(edit) => assert_eq!(edit.code, "<h1>hi</h1>"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn canvas_payload_is_base64_on_the_wire() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"canvas-update","roomId":"room-ab12cd34e","canvasData":"AQID"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::CanvasChange(edit) => assert_eq!(edit.canvas_data, vec![1, 2, 3]),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn server_messages_echo_the_expected_wire_names() {
        let text = serde_json::to_string(&ServerMessage::CodeUpdate(CodeUpdateMessage {
            code: "<h1>hi</h1>".into(),
        }))
        .unwrap();
        assert_eq!(text, r#"{"type":"code-update","code":"<h1>hi</h1>"}"#);

        let text = serde_json::to_string(&ServerMessage::Error(ErrorMessage {
            message: "Room does not exist".into(),
        }))
        .unwrap();
        assert_eq!(text, r#"{"type":"error","message":"Room does not exist"}"#);

        // absent artifacts stay off the wire
        let text = serde_json::to_string(&ServerMessage::RoomJoined(RoomJoinedMessage {
            code: "x".into(),
            canvas_data: None,
            image_url: None,
        }))
        .unwrap();
        assert_eq!(text, r#"{"type":"roomJoined","code":"x"}"#);
    }
}
