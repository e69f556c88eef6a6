//! # Sweeper Load Client
//!
//! Simulates several players sharing one Minesweeper session over the real
//! binary WebSocket protocol. The first player creates the session; the
//! others join it by id once it exists. Every player makes random reveal and
//! flag moves, the host resets the board after each game, and all decoded
//! server events are logged.

mod view;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use sweeper_core::{GameEvent, SessionId};
use sweeper_protocol::{decode_event, encode_command, ClientCommand, SessionRequest};
use tokio::sync::oneshot;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use view::{BoardView, Outcome};

#[derive(Parser, Debug, Clone)]
#[command(name = "sweeper-simulate")]
#[command(about = "Plays random Minesweeper moves against a sweeper server")]
struct Args {
    /// Server WebSocket URL
    #[arg(short, long, default_value = "ws://127.0.0.1:8080")]
    url: String,

    /// Number of simultaneous players in the session
    #[arg(short, long, default_value = "3")]
    players: u32,

    /// Board height
    #[arg(long, default_value = "16")]
    rows: u8,

    /// Board width
    #[arg(long, default_value = "16")]
    cols: u8,

    /// Mines on the board
    #[arg(short, long, default_value = "40")]
    mines: u8,

    /// Simulation duration in seconds
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Delay between a player's moves, in milliseconds
    #[arg(long, default_value = "250")]
    move_interval_ms: u64,
}

/// How a simulated player enters the game.
enum Role {
    /// Creates the session and reports its id once the server assigns it
    Host(oneshot::Sender<SessionId>),
    Guest(SessionId),
}

#[derive(Debug, Default)]
struct PlayerStats {
    sent: u64,
    received: u64,
    games_won: u64,
    games_lost: u64,
}

/// Runs a single player until the duration elapses or the server closes.
async fn simulate_player(player: u32, role: Role, args: Args) -> Result<PlayerStats> {
    let (ws_stream, _) = connect_async(args.url.as_str())
        .await
        .with_context(|| format!("player {player} could not connect to {}", args.url))?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let (request, mut announce) = match role {
        Role::Host(sender) => (
            SessionRequest::New {
                rows: args.rows,
                cols: args.cols,
                mine_count: args.mines,
            },
            Some(sender),
        ),
        Role::Guest(session_id) => (SessionRequest::Join(session_id), None),
    };
    let is_host = announce.is_some();

    ws_sender
        .send(Message::binary(encode_command(&ClientCommand::Connect(request))))
        .await?;

    let mut stats = PlayerStats {
        sent: 1,
        ..Default::default()
    };
    let mut board = BoardView::new();
    let mut rng = StdRng::from_entropy();
    let mut move_timer = interval(Duration::from_millis(args.move_interval_ms.max(1)));
    move_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = Instant::now() + Duration::from_secs(args.duration);

    info!("🎮 Player {} connected to {}", player, args.url);

    loop {
        tokio::select! {
            msg = ws_receiver.next() => match msg {
                Some(Ok(Message::Binary(bytes))) => {
                    stats.received += 1;
                    let event = match decode_event(&bytes) {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("⚠️ Player {} could not decode a server frame: {}", player, e);
                            continue;
                        }
                    };
                    log_event(player, &event);

                    let previous = board.outcome;
                    board.apply(&event);
                    match (previous, board.outcome) {
                        (Outcome::Playing, Outcome::Won) => stats.games_won += 1,
                        (Outcome::Playing, Outcome::Lost) => stats.games_lost += 1,
                        _ => {}
                    }

                    if let (Some(session_id), Some(sender)) = (board.session_id, announce.take()) {
                        // The receiver is gone only if main already gave up
                        let _ = sender.send(session_id);
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("🔌 Player {} connection closed by server: {:?}", player, frame);
                    break;
                }
                Some(Ok(other)) => debug!("Player {} ignoring {:?}", player, other),
                Some(Err(e)) => {
                    warn!("⚠️ Player {} WebSocket error: {}", player, e);
                    break;
                }
                None => {
                    info!("🔌 Player {} connection closed (stream ended)", player);
                    break;
                }
            },
            _ = move_timer.tick() => {
                if Instant::now() >= deadline {
                    info!("⏰ Player {} simulation complete", player);
                    break;
                }

                let command = match board.outcome {
                    Outcome::Playing => board.random_move(&mut rng),
                    Outcome::Won | Outcome::Lost if is_host => Some(ClientCommand::Reset),
                    _ => None,
                };
                if let Some(command) = command {
                    debug!("📤 Player {} sends {:?}", player, command);
                    ws_sender.send(Message::binary(encode_command(&command))).await?;
                    stats.sent += 1;
                }
            }
        }
    }

    if !board.is_connected() {
        bail!("player {player} never received Connected");
    }

    let _ = ws_sender.send(Message::Close(None)).await;
    Ok(stats)
}

fn log_event(player: u32, event: &GameEvent) {
    match event {
        GameEvent::Connected { session_id, params } => info!(
            "✅ Player {} in session {} ({}x{}, {} mines)",
            player, session_id, params.rows, params.cols, params.mine_count
        ),
        GameEvent::RevealBatch(deltas) => {
            debug!("📥 Player {} received {} tile update(s)", player, deltas.len())
        }
        GameEvent::Lost => info!("💥 Player {} saw the game lost", player),
        GameEvent::Won => info!("🏁 Player {} saw the game won", player),
        GameEvent::Reset => info!("🔄 Player {} saw the board reset", player),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    if args.players == 0 {
        bail!("--players must be at least 1");
    }

    info!("🚀 Starting Sweeper load client");
    info!("   • Players: {}", args.players);
    info!("   • Board: {}x{} with {} mines", args.rows, args.cols, args.mines);
    info!("   • Move interval: {} ms", args.move_interval_ms);
    info!("   • Duration: {} seconds", args.duration);
    info!("   • Server: {}", args.url);

    let (session_sender, session_receiver) = oneshot::channel();
    let mut handles = vec![tokio::spawn(simulate_player(
        0,
        Role::Host(session_sender),
        args.clone(),
    ))];

    let session_id = session_receiver
        .await
        .context("host player failed before the session was created")?;
    info!("🎯 Session {} created; {} guest(s) joining", session_id, args.players - 1);

    for player in 1..args.players {
        handles.push(tokio::spawn(simulate_player(
            player,
            Role::Guest(session_id),
            args.clone(),
        )));
        // Stagger connections to avoid overwhelming server
        sleep(Duration::from_millis(100)).await;
    }

    let mut totals = PlayerStats::default();
    for (player, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(stats)) => {
                info!(
                    "📊 Player {} sent {} / received {} frames",
                    player, stats.sent, stats.received
                );
                totals.sent += stats.sent;
                totals.received += stats.received;
                totals.games_won = totals.games_won.max(stats.games_won);
                totals.games_lost = totals.games_lost.max(stats.games_lost);
            }
            Ok(Err(e)) => error!("❌ Player {} simulation failed: {:#}", player, e),
            Err(e) => error!("❌ Player {} task panicked: {}", player, e),
        }
    }

    info!("✅ Simulation complete");
    info!(
        "   • Frames sent: {} | received: {}",
        totals.sent, totals.received
    );
    info!(
        "   • Games won: {} | lost: {}",
        totals.games_won, totals.games_lost
    );
    Ok(())
}
