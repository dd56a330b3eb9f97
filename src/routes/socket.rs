//! The Connection Endpoint's transport binding (§4.3): one WebSocket per
//! connection, driven by `rocket_ws`. This is the only module that knows
//! frames are JSON-over-WebSocket — everything past here deals in typed
//! [`ClientEvent`]/[`ServerEvent`]s.

use crate::connection::ConnectionRegistry;
use crate::hub::RoomHub;
use crate::protocol::ClientEvent;
use futures_util::{SinkExt, StreamExt};
use rocket::{get, State};
use rocket_ws::{Message, WebSocket};
use std::sync::Arc;
use uuid::Uuid;

#[get("/ws")]
pub fn ws_connect(
    ws: WebSocket,
    hub: &State<Arc<RoomHub>>,
    connections: &State<Arc<ConnectionRegistry>>,
) -> rocket_ws::Channel<'static> {
    let hub = Arc::clone(hub.inner());
    let connections = Arc::clone(connections.inner());
    let connection_id = Uuid::new_v4().to_string();

    ws.channel(move |stream| {
        Box::pin(async move {
            let (mut sink, mut source) = stream.split();
            let mut outbound = connections.register(connection_id.clone());

            let forward_hub = Arc::clone(&hub);
            let forward_connection_id = connection_id.clone();
            let forward_task = tokio::spawn(async move {
                while let Some(event) = outbound.recv().await {
                    let Ok(payload) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sink.send(Message::Text(payload)).await.is_err() {
                        // Transport write failed out from under the read loop
                        // below: tear the connection down now rather than
                        // waiting on `source` to notice (it may never).
                        forward_hub.handle_disconnect(forward_connection_id).await;
                        break;
                    }
                }
            });

            while let Some(message) = source.next().await {
                let Ok(message) = message else { break };
                let text = match message {
                    Message::Text(text) => text,
                    Message::Close(_) => break,
                    _ => continue,
                };
                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => hub.handle_client_event(connection_id.clone(), event).await,
                    Err(_) => continue, // malformed frame: a validation error, non-fatal (§7)
                }
            }

            hub.handle_disconnect(connection_id.clone()).await;
            forward_task.abort();
            Ok(())
        })
    })
}
