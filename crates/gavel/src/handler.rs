//! Per-connection handler: decode requests, route them, send one reply each.
//!
//! Each accepted connection gets its own Tokio task running this loop.
//! Connections are stateless: every request names the room and user it
//! acts for, so a client may reconnect and carry on.

use std::sync::Arc;

use gavel_auction::AuctionError;
use gavel_protocol::{Codec, Envelope, ErrorKind, Payload, Request, Response};

use crate::GavelError;
use crate::server::ServerState;
use crate::transport::{Connection, WebSocketConnection};

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GavelError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                let reply = Response::error(ErrorKind::BadRequest, e.to_string());
                send_reply(&conn, &state, 0, reply).await?;
                continue;
            }
        };

        let reply = match envelope.payload {
            Payload::Request(request) => {
                let name = request.name();
                let reply = dispatch(&state, request).await;
                if let Response::Error { kind, message, .. } = &reply {
                    tracing::debug!(%conn_id, request = name, ?kind, %message, "request rejected");
                }
                reply
            }
            Payload::Response(_) => {
                Response::error(ErrorKind::BadRequest, "clients send requests, not responses")
            }
        };
        send_reply(&conn, &state, envelope.seq, reply).await?;
    }

    Ok(())
}

/// Turns one request into its response; failures become error responses.
async fn dispatch<C: Codec>(state: &ServerState<C>, request: Request) -> Response {
    route(state, request)
        .await
        .unwrap_or_else(|err| Response::error(err.kind(), err.to_string()))
}

async fn route<C: Codec>(state: &ServerState<C>, request: Request) -> Result<Response, AuctionError> {
    match request {
        Request::CreateRoom {
            room_name,
            display_name,
        } => {
            let created = {
                let mut rooms = state.rooms.lock().await;
                let pruned = rooms.prune_stopped();
                if pruned > 0 {
                    tracing::debug!(pruned, "dropped stopped rooms");
                }
                rooms.create_room(&room_name, &display_name)?
            };
            Ok(Response::RoomCreated {
                room: created.room,
                user_id: created.user_id,
                member: created.member,
            })
        }
        Request::Heartbeat { client_time } => Ok(Response::HeartbeatAck {
            client_time,
            server_time: state.uptime_ms(),
        }),
        request => {
            let code = request
                .room_code()
                .cloned()
                .ok_or_else(|| AuctionError::BadRequest(format!("{} names no room", request.name())))?;
            // Lock only for the lookup, release before talking to the room.
            let handle = state.rooms.lock().await.get(&code)?;
            handle.request(request).await
        }
    }
}

async fn send_reply<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    seq: u64,
    response: Response,
) -> Result<(), GavelError> {
    let envelope = Envelope::reply(seq, state.uptime_ms(), response);
    let bytes = state.codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}
