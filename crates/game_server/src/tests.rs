// End-to-end tests over real WebSocket connections
#[cfg(test)]
mod tests {
    use crate::*;
    use futures_util::{SinkExt, StreamExt};
    use std::{collections::BTreeSet, net::SocketAddr, sync::Arc, time::Duration};
    use sweeper_core::{BoardParams, Coord, GameEvent, TileDelta, TileKind};
    use sweeper_protocol::{decode_event, encode_command, ClientCommand, SessionRequest};
    use tokio::{net::TcpListener, net::TcpStream, task::JoinHandle, time::timeout};
    use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct TestServer {
        server: Arc<GameServer>,
        addr: SocketAddr,
        shutdown: ShutdownState,
        task: JoinHandle<Result<(), ServerError>>,
    }

    async fn start_test_server(config: ServerConfig) -> TestServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(create_server_with_config(config));
        let shutdown = ShutdownState::new();

        let task = tokio::spawn({
            let server = server.clone();
            let shutdown = shutdown.clone();
            async move { server.serve(listener, Some(shutdown)).await }
        });

        TestServer {
            server,
            addr,
            shutdown,
            task,
        }
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        ws
    }

    async fn send(ws: &mut Client, command: ClientCommand) {
        ws.send(Message::binary(encode_command(&command))).await.unwrap();
    }

    /// Next decoded event, or `None` once the server closed the connection.
    async fn next_event(ws: &mut Client) -> Option<GameEvent> {
        loop {
            let message = timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("server answered in time")?
                .ok()?;
            match message {
                Message::Binary(bytes) => return Some(decode_event(&bytes).unwrap()),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    fn new_session(rows: u8, cols: u8, mine_count: u8) -> ClientCommand {
        ClientCommand::Connect(SessionRequest::New {
            rows,
            cols,
            mine_count,
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_game_to_victory() {
        let test = start_test_server(ServerConfig::default()).await;
        let mut ws = connect(test.addr).await;

        send(&mut ws, new_session(10, 10, 5)).await;
        assert_eq!(
            next_event(&mut ws).await,
            Some(GameEvent::Connected {
                session_id: 0,
                params: BoardParams::new(10, 10, 5).unwrap()
            })
        );

        send(&mut ws, ClientCommand::Reveal { coord: Coord::new(5, 5) }).await;
        let Some(GameEvent::RevealBatch(tiles)) = next_event(&mut ws).await else {
            panic!("expected the opening reveal");
        };
        assert!(tiles.contains(&TileDelta::new(Coord::new(5, 5), TileKind::Count(0))));

        let (mines, hidden_safe) = {
            let handle = test.server.get_registry().get_session(0).await.unwrap();
            let session = handle.lock().await;
            let board = session.state().board().unwrap();
            let mines: BTreeSet<Coord> = board.mine_coordinates().clone();
            let hidden_safe: Vec<Coord> = (0..10u16)
                .flat_map(|row| (0..10u16).map(move |col| Coord::new(row, col)))
                .filter(|coord| !mines.contains(coord) && !board.tile(*coord).unwrap().is_revealed)
                .collect();
            (mines, hidden_safe)
        };

        for mine in &mines {
            send(&mut ws, ClientCommand::Flag { coord: *mine, unflag: false }).await;
        }
        for coord in &hidden_safe {
            send(&mut ws, ClientCommand::Reveal { coord: *coord }).await;
        }

        loop {
            let event = next_event(&mut ws).await.expect("connection stays open");
            assert_ne!(event, GameEvent::Lost);
            if event == GameEvent::Won {
                break;
            }
        }

        test.shutdown.initiate_shutdown();
        test.task.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_joining_client_is_resynchronized() {
        let test = start_test_server(ServerConfig::default()).await;
        let mut creator = connect(test.addr).await;
        send(&mut creator, new_session(12, 12, 30)).await;
        let Some(GameEvent::Connected { session_id, .. }) = next_event(&mut creator).await else {
            panic!("expected Connected");
        };

        send(&mut creator, ClientCommand::Reveal { coord: Coord::new(0, 0) }).await;
        let Some(GameEvent::RevealBatch(opening)) = next_event(&mut creator).await else {
            panic!("expected a reveal batch");
        };

        let mut joiner = connect(test.addr).await;
        send(&mut joiner, ClientCommand::Connect(SessionRequest::Join(session_id))).await;
        assert!(matches!(
            next_event(&mut joiner).await,
            Some(GameEvent::Connected { params, .. })
                if params == BoardParams::new(12, 12, 30).unwrap()
        ));

        let Some(GameEvent::RevealBatch(resync)) = next_event(&mut joiner).await else {
            panic!("expected a resync batch");
        };
        let opening: BTreeSet<_> = opening.iter().map(|tile| tile.coord).collect();
        let resync: BTreeSet<_> = resync.iter().map(|tile| tile.coord).collect();
        assert_eq!(opening, resync);

        // Moves by the joiner reach the creator
        send(&mut joiner, ClientCommand::Reset).await;
        assert_eq!(next_event(&mut creator).await, Some(GameEvent::Reset));
        assert_eq!(next_event(&mut joiner).await, Some(GameEvent::Reset));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_session_closes_connection() {
        let test = start_test_server(ServerConfig::default()).await;
        let mut ws = connect(test.addr).await;

        send(&mut ws, ClientCommand::Connect(SessionRequest::Join(9))).await;
        assert_eq!(next_event(&mut ws).await, None);
        assert_eq!(test.server.get_registry().session_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_first_message_must_be_connect() {
        let test = start_test_server(ServerConfig::default()).await;

        let mut ws = connect(test.addr).await;
        send(&mut ws, ClientCommand::Reset).await;
        assert_eq!(next_event(&mut ws).await, None);

        let mut ws = connect(test.addr).await;
        ws.send(Message::text("hello")).await.unwrap();
        assert_eq!(next_event(&mut ws).await, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_frames_do_not_close_bound_connection() {
        let test = start_test_server(ServerConfig::default()).await;
        let mut ws = connect(test.addr).await;
        send(&mut ws, new_session(5, 5, 3)).await;
        next_event(&mut ws).await.unwrap();

        ws.send(Message::binary(vec![0x42, 1, 2])).await.unwrap();
        ws.send(Message::binary(vec![0x81, 0])).await.unwrap();
        ws.send(Message::text("not a command")).await.unwrap();
        send(&mut ws, ClientCommand::Reset).await;

        assert_eq!(next_event(&mut ws).await, Some(GameEvent::Reset));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connections_over_limit_are_refused() {
        let test = start_test_server(ServerConfig {
            max_connections: 1,
            ..Default::default()
        })
        .await;

        let mut first = connect(test.addr).await;
        send(&mut first, new_session(4, 4, 2)).await;
        next_event(&mut first).await.unwrap();

        let second = timeout(Duration::from_secs(5), connect_async(format!("ws://{}", test.addr)))
            .await
            .expect("refusal is prompt");
        assert!(second.is_err());
        assert_eq!(test.server.get_connection_manager().connection_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_idle_sessions_are_reaped() {
        let test = start_test_server(ServerConfig {
            session_idle_timeout_secs: 1,
            reap_interval_ms: 50,
            ..Default::default()
        })
        .await;

        let mut ws = connect(test.addr).await;
        send(&mut ws, new_session(4, 4, 2)).await;
        next_event(&mut ws).await.unwrap();
        let registry = test.server.get_registry();
        assert_eq!(registry.session_count().await, 1);

        // Attached sessions survive
        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(registry.session_count().await, 1);

        ws.close(None).await.unwrap();
        drop(ws);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(registry.session_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_closes_open_connections() {
        let test = start_test_server(ServerConfig::default()).await;
        let mut ws = connect(test.addr).await;
        send(&mut ws, new_session(4, 4, 2)).await;
        next_event(&mut ws).await.unwrap();

        test.server.shutdown().await.unwrap();
        assert_eq!(next_event(&mut ws).await, None);

        timeout(Duration::from_secs(10), test.task)
            .await
            .expect("server stopped")
            .unwrap()
            .unwrap();
        assert!(test.shutdown.is_shutdown_complete());
    }
}
