//! WebSocket实时推送
//!
//! 显示屏、操作台和客户页面通过 `/realtime/ws` 订阅行变更事件。
//! 带 `clinic_id` 参数时只推送该诊所的事件。

use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    pub clinic_id: Option<Uuid>,
}

/// WebSocket升级入口
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<SubscribeParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.clinic_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, clinic_id: Option<Uuid>) {
    let mut stream = match clinic_id {
        Some(id) => state.hub().subscribe_clinic(id),
        None => state.hub().subscribe(),
    };
    info!(
        "Realtime subscriber connected (clinic filter: {:?})",
        clinic_id
    );

    loop {
        tokio::select! {
            event = stream.recv() => {
                let Some(event) = event else {
                    break;
                };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode realtime event: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            message = socket.recv() => {
                match message {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    // 订阅端不需要上行消息
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    debug!("Realtime subscriber disconnected");
}
