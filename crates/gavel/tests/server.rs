//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gavel::prelude::*;
use gavel_protocol::{AuctionSnapshot, Room};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

fn rules() -> AuctionConfig {
    AuctionConfig {
        team_min: 1,
        ..AuctionConfig::default()
    }
    .with_countdown(2)
}

/// Starts a server on a random port and returns the address.
async fn start_server(builder: GavelServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .seed(5)
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("should have local addr").to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

struct Client {
    ws: ClientWs,
    seq: u64,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        Self { ws, seq: 0 }
    }

    async fn send_text(&mut self, text: String) {
        self.ws.send(Message::text(text)).await.expect("send");
    }

    async fn recv(&mut self) -> Envelope {
        let msg = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
            .await
            .expect("timeout")
            .expect("stream ended")
            .expect("recv");
        serde_json::from_slice(&msg.into_data()).expect("decode")
    }

    /// Sends `request` and returns the response carrying the same `seq`.
    async fn call(&mut self, request: Request) -> Response {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: 0,
            payload: Payload::Request(request),
        };
        self.send_text(serde_json::to_string(&envelope).unwrap()).await;

        let reply = self.recv().await;
        assert_eq!(reply.seq, self.seq);
        match reply.payload {
            Payload::Response(response) => response,
            other => panic!("expected Response, got {other:?}"),
        }
    }

    async fn ok(&mut self, request: Request) -> Response {
        let response = self.call(request).await;
        assert!(!response.is_error(), "unexpected error: {response:?}");
        response
    }

    async fn auction(&mut self, code: &RoomCode) -> AuctionSnapshot {
        match self.ok(Request::GetAuction { code: code.clone() }).await {
            Response::Auction(snapshot) => *snapshot,
            other => panic!("expected Auction, got {other:?}"),
        }
    }
}

fn error_kind(response: &Response) -> ErrorKind {
    match response {
        Response::Error { kind, .. } => *kind,
        other => panic!("expected Error, got {other:?}"),
    }
}

async fn create_room(client: &mut Client) -> (Room, UserId) {
    match client
        .ok(Request::CreateRoom {
            room_name: "Mega auction".into(),
            display_name: "Host".into(),
        })
        .await
    {
        Response::RoomCreated { room, user_id, .. } => (room, user_id),
        other => panic!("expected RoomCreated, got {other:?}"),
    }
}

async fn join_room(client: &mut Client, code: &RoomCode, name: &str) -> UserId {
    match client
        .ok(Request::JoinRoom {
            code: code.clone(),
            display_name: name.into(),
            role: None,
            user_id: None,
        })
        .await
    {
        Response::Joined { user_id, .. } => user_id,
        other => panic!("expected Joined, got {other:?}"),
    }
}

// =========================================================================
// Framing
// =========================================================================

#[tokio::test]
async fn test_heartbeat_echoes_client_time() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut client = Client::connect(&addr).await;

    match client.ok(Request::Heartbeat { client_time: 12_345 }).await {
        Response::HeartbeatAck { client_time, .. } => assert_eq!(client_time, 12_345),
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_frame_gets_bad_request_and_connection_survives() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut client = Client::connect(&addr).await;

    client.send_text("not json".into()).await;
    let reply = client.recv().await;
    assert_eq!(reply.seq, 0);
    match reply.payload {
        Payload::Response(Response::Error { kind, code, .. }) => {
            assert_eq!(kind, ErrorKind::BadRequest);
            assert_eq!(code, 400);
        }
        other => panic!("expected Error, got {other:?}"),
    }

    client.ok(Request::Heartbeat { client_time: 1 }).await;
}

#[tokio::test]
async fn test_unknown_franchise_is_bad_request() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut client = Client::connect(&addr).await;

    client
        .send_text(
            r#"{"seq":9,"timestamp":0,"payload":{"type":"Request","data":
                {"type":"selectFranchise","code":"ABCDEF","userId":"u","franchise":"XYZ"}}}"#
                .into(),
        )
        .await;
    let reply = client.recv().await;
    assert!(matches!(
        reply.payload,
        Payload::Response(Response::Error {
            kind: ErrorKind::BadRequest,
            ..
        })
    ));
}

#[tokio::test]
async fn test_response_payload_from_client_is_rejected() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut client = Client::connect(&addr).await;

    let envelope = Envelope::reply(3, 0, Response::HeartbeatAck {
        client_time: 0,
        server_time: 0,
    });
    client.send_text(serde_json::to_string(&envelope).unwrap()).await;

    let reply = client.recv().await;
    assert_eq!(reply.seq, 3);
    assert!(matches!(
        reply.payload,
        Payload::Response(Response::Error {
            kind: ErrorKind::BadRequest,
            ..
        })
    ));
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_server(GavelServerBuilder::new().idle_timeout(Duration::from_millis(100))).await;
    let mut client = Client::connect(&addr).await;

    let next = tokio::time::timeout(Duration::from_secs(5), client.ws.next())
        .await
        .expect("server should close the idle connection");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut client = Client::connect(&addr).await;

    let response = client
        .call(Request::GetRoom {
            code: RoomCode::parse("ZZZZZZ").unwrap(),
        })
        .await;
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert!(matches!(response, Response::Error { code: 404, .. }));
}

#[tokio::test]
async fn test_room_code_lookup_is_case_insensitive() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut host = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;
    let (room, _) = create_room(&mut host).await;

    let frame = format!(
        r#"{{"seq":1,"timestamp":0,"payload":{{"type":"Request","data":
            {{"type":"joinRoom","code":"{}","displayName":"Guest"}}}}}}"#,
        room.code.as_str().to_ascii_lowercase()
    );
    guest.send_text(frame).await;

    let reply = guest.recv().await;
    match reply.payload {
        Payload::Response(Response::Joined { room: joined, .. }) => assert_eq!(joined.code, room.code),
        other => panic!("expected Joined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lower_case_franchise_code_is_accepted() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut host = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;
    let (room, host_id) = create_room(&mut host).await;
    join_room(&mut guest, &room.code, "Guest").await;
    host.ok(Request::StartTeamSelection {
        code: room.code.clone(),
        user_id: host_id.clone(),
    })
    .await;

    let frame = format!(
        r#"{{"seq":7,"timestamp":0,"payload":{{"type":"Request","data":
            {{"type":"selectFranchise","code":"{}","userId":"{}","franchise":"csk"}}}}}}"#,
        room.code, host_id
    );
    host.send_text(frame).await;

    let reply = host.recv().await;
    assert_eq!(reply.seq, 7);
    match reply.payload {
        Payload::Response(Response::FranchiseSelected { team }) => {
            assert_eq!(team.franchise, FranchiseCode::Csk);
            assert_eq!(team.owner, host_id);
        }
        other => panic!("expected FranchiseSelected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_host_cannot_start_selection() {
    let addr = start_server(GavelServerBuilder::new()).await;
    let mut host = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;
    let (room, _) = create_room(&mut host).await;
    let guest_id = join_room(&mut guest, &room.code, "Guest").await;

    let response = guest
        .call(Request::StartTeamSelection {
            code: room.code.clone(),
            user_id: guest_id,
        })
        .await;
    assert_eq!(error_kind(&response), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_full_auction_round_over_websocket() {
    let addr = start_server(GavelServerBuilder::new().config(rules())).await;
    let mut host = Client::connect(&addr).await;
    let mut guest = Client::connect(&addr).await;

    let (room, host_id) = create_room(&mut host).await;
    let code = room.code.clone();
    let guest_id = join_room(&mut guest, &code, "Guest").await;

    host.ok(Request::StartTeamSelection {
        code: code.clone(),
        user_id: host_id.clone(),
    })
    .await;

    let out_of_turn = guest
        .call(Request::SelectFranchise {
            code: code.clone(),
            user_id: guest_id.clone(),
            franchise: FranchiseCode::Mi,
        })
        .await;
    assert_eq!(error_kind(&out_of_turn), ErrorKind::NotYourTurn);

    host.ok(Request::SelectFranchise {
        code: code.clone(),
        user_id: host_id.clone(),
        franchise: FranchiseCode::Csk,
    })
    .await;
    guest
        .ok(Request::SelectFranchise {
            code: code.clone(),
            user_id: guest_id.clone(),
            franchise: FranchiseCode::Mi,
        })
        .await;
    host.ok(Request::StartAuction {
        code: code.clone(),
        user_id: host_id.clone(),
    })
    .await;

    let snapshot = guest.auction(&code).await;
    assert!(snapshot.is_active);
    let player = snapshot.current_player.expect("a player on the block").id;
    let opening = snapshot.next_min_bid.expect("an opening bid");

    let wrong = host
        .call(Request::PlaceBid {
            code: code.clone(),
            user_id: host_id.clone(),
            amount: opening + 1,
            expected_version: None,
        })
        .await;
    assert_eq!(error_kind(&wrong), ErrorKind::AmountMismatch);

    match host
        .ok(Request::PlaceBid {
            code: code.clone(),
            user_id: host_id.clone(),
            amount: opening,
            expected_version: Some(snapshot.room.version),
        })
        .await
    {
        Response::BidAccepted { bid, .. } => {
            assert_eq!(bid.franchise, FranchiseCode::Csk);
            assert_eq!(bid.amount, opening);
        }
        other => panic!("expected BidAccepted, got {other:?}"),
    }

    let stale = guest
        .call(Request::PlaceBid {
            code: code.clone(),
            user_id: guest_id.clone(),
            amount: opening,
            expected_version: Some(snapshot.room.version),
        })
        .await;
    assert_eq!(error_kind(&stale), ErrorKind::VersionConflict);

    // The room's own timer settles the player once the countdown lapses.
    tokio::time::sleep(Duration::from_millis(3_000)).await;

    let after = guest.auction(&code).await;
    let csk = after
        .teams
        .iter()
        .find(|t| t.team.franchise == FranchiseCode::Csk)
        .expect("CSK is in the room");
    assert_eq!(csk.squad.len(), 1);
    assert_eq!(csk.squad[0].player_id, player);
    assert_eq!(csk.team.purse_left, 10_000 - opening);

    match host.ok(Request::GetSummary { code: code.clone() }).await {
        Response::Summary(summary) => {
            assert_eq!(summary.teams.len(), 2);
            assert_eq!(summary.teams[0].players[0].player.id, player);
        }
        other => panic!("expected Summary, got {other:?}"),
    }
}
