use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use prost::Message;
use tokio::sync::Mutex;

use territory_server::config::{
    DEFAULT_BIND_ADDR, DEFAULT_PORT, SESSION_CLEANUP_INTERVAL_SECONDS, SESSION_TIMEOUT_SECONDS,
};
use territory_server::game::traits::{Game, PlayerId};
use territory_server::games::territory::{TerritoryConfig, TerritoryGame};
use territory_server::network::udp::UdpServer;
use territory_server::protocol::client::{
    ClientMessage, JoinGame, Ping,
    client_message::Payload,
};
use territory_server::protocol::server::{
    Error, GameOver, PlayerLeft, Pong, ServerMessage, server_message,
};
use territory_server::session::SessionManager;

/// Authoritative territory game server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = DEFAULT_BIND_ADDR)]
    bind: String,
    /// UDP port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Board width in tiles
    #[arg(long, default_value_t = 80)]
    cols: u32,
    /// Board height in tiles
    #[arg(long, default_value_t = 50)]
    rows: u32,
    /// Ticks a trail tile survives
    #[arg(long, default_value_t = 60)]
    trail_max_len: u32,
    /// Area a player must exceed to win, half the board when omitted
    #[arg(long)]
    win_threshold: Option<u32>,
    /// Ticks per second
    #[arg(long, default_value_t = 10)]
    tick_rate: u32,
    /// Maximum number of players
    #[arg(long, default_value_t = 4)]
    max_players: usize,
    /// Seed for pickup placement
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

impl Args {
    fn game_config(&self) -> TerritoryConfig {
        let mut config = TerritoryConfig::with_grid_size(self.cols, self.rows);
        config.trail_max_len = self.trail_max_len;
        config.tick_rate_hz = self.tick_rate;
        config.max_players = self.max_players;
        config.seed = self.seed;
        if let Some(threshold) = self.win_threshold {
            config.win_threshold = threshold;
        }
        config
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("territory_server=debug".parse().expect("static directive")),
        )
        .init();

    let args = Args::parse();
    let config = args.game_config();
    let max_players = config.max_players;
    let game = match TerritoryGame::new(config) {
        Ok(game) => game,
        Err(e) => {
            tracing::error!("Invalid game configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };
    let tick_duration = game.tick_rate();

    let server = Arc::new(UdpServer::bind(&format!("{}:{}", args.bind, args.port)).await?);
    tracing::info!("Territory server started ({}x{})", args.cols, args.rows);

    let sessions = Arc::new(Mutex::new(SessionManager::new(max_players, SESSION_TIMEOUT_SECONDS)));
    let game = Arc::new(Mutex::new(game));

    // Game loop
    let sessions_tick = sessions.clone();
    let game_tick = game.clone();
    let server_tick = server.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_duration);
        loop {
            interval.tick().await;
            let sessions = sessions_tick.lock().await;
            let mut game = game_tick.lock().await;

            let result = game.tick();
            let addrs = sessions.addrs();
            if let Some(bytes) = result.broadcast {
                server_tick.send_to_many(&bytes, &addrs).await;
                tracing::trace!("Tick {} sent to {} players", game.current_tick(), addrs.len());
            }
            if let Some((winner_id, winner_area)) = result.game_over {
                let msg = ServerMessage {
                    payload: Some(server_message::Payload::GameOver(GameOver {
                        winner_id: winner_id as u32,
                        winner_area,
                    })),
                };
                server_tick.send_to_many(&msg.encode_to_vec(), &addrs).await;
                tracing::info!("Player {} won with {} tiles", winner_id, winner_area);
            }
        }
    });

    // Cleanup task for timed-out sessions
    let sessions_cleanup = sessions.clone();
    let game_cleanup = game.clone();
    let server_cleanup = server.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            SESSION_CLEANUP_INTERVAL_SECONDS,
        ));
        loop {
            interval.tick().await;
            let mut sessions = sessions_cleanup.lock().await;
            let mut game = game_cleanup.lock().await;

            for session in sessions.cleanup_timed_out() {
                game.player_left(session.player_id);
                notify_player_left(&server_cleanup, &sessions, session.player_id).await;
            }
        }
    });

    // Main receive loop
    loop {
        let (data, addr) = match server.recv().await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("recv error - sent to closed port. Ignoring. Error: {}", e);
                continue;
            }
        };

        let msg = match ClientMessage::decode(&data[..]) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Failed to decode from {}: {}", addr, e);
                continue;
            }
        };

        let mut sessions = sessions.lock().await;
        let mut game = game.lock().await;

        match msg.payload {
            Some(Payload::JoinGame(join)) => {
                handle_join(&server, &mut sessions, &mut game, addr, join).await;
            }

            Some(Payload::GameInput(input)) => {
                handle_input(&mut sessions, &mut game, addr, &input.payload);
            }

            Some(Payload::LeaveGame(_)) => {
                handle_leave(&server, &mut sessions, &mut game, addr).await;
            }

            Some(Payload::Ping(ping)) => {
                handle_ping(&server, &mut sessions, addr, ping).await;
            }

            None => {
                tracing::warn!("Empty message from {}", addr);
            }
        }
    }
}

async fn send_error(server: &UdpServer, addr: SocketAddr, message: String) {
    let response = ServerMessage {
        payload: Some(server_message::Payload::Error(Error { message })),
    };
    if let Err(e) = server.send(&response.encode_to_vec(), addr).await {
        tracing::warn!("Failed to send error to {}: {}", addr, e);
    }
}

async fn notify_player_left(server: &UdpServer, sessions: &SessionManager, player_id: PlayerId) {
    let msg = ServerMessage {
        payload: Some(server_message::Payload::PlayerLeft(PlayerLeft {
            player_id: player_id as u32,
        })),
    };
    server.send_to_many(&msg.encode_to_vec(), &sessions.addrs()).await;
}

async fn handle_join(
    server: &UdpServer,
    sessions: &mut SessionManager,
    game: &mut TerritoryGame,
    addr: SocketAddr,
    join: JoinGame,
) {
    let player_id = match sessions.register(addr, join.player_name.clone()) {
        Ok(session) => session.player_id,
        Err(e) => {
            tracing::info!("Rejected join from {}: {}", addr, e);
            send_error(server, addr, format!("Failed to join: {}", e)).await;
            return;
        }
    };

    if game.engine().player(player_id).is_some() {
        tracing::debug!("Player {} re-sent join, resending state", player_id);
    } else {
        match game.player_joined(player_id, join.player_name.clone()) {
            Ok(welcome) => {
                if let Err(e) = server.send(&welcome, addr).await {
                    tracing::warn!("Failed to send welcome to {}: {}", addr, e);
                }
            }
            Err(e) => {
                sessions.remove(&addr);
                send_error(server, addr, format!("Failed to join: {}", e)).await;
                return;
            }
        }
    }

    if let Err(e) = server.send(&game.encode_state(), addr).await {
        tracing::warn!("Failed to send full state to {}: {}", addr, e);
    }
    tracing::info!(
        "Player {} ({}) joined ({} players)",
        player_id,
        join.player_name,
        sessions.len()
    );
}

fn handle_input(
    sessions: &mut SessionManager,
    game: &mut TerritoryGame,
    addr: SocketAddr,
    payload: &[u8],
) {
    sessions.update_last_seen(&addr);

    let Some(session) = sessions.get_by_addr(&addr) else {
        tracing::warn!("GameInput from unknown address: {}", addr);
        return;
    };

    if let Err(e) = game.handle_input(session.player_id, payload) {
        tracing::debug!("Dropped input from player {}: {}", session.player_id, e);
    }
}

async fn handle_leave(
    server: &UdpServer,
    sessions: &mut SessionManager,
    game: &mut TerritoryGame,
    addr: SocketAddr,
) {
    if let Some(session) = sessions.remove(&addr) {
        game.player_left(session.player_id);
        notify_player_left(server, sessions, session.player_id).await;
    }
}

async fn handle_ping(server: &UdpServer, sessions: &mut SessionManager, addr: SocketAddr, ping: Ping) {
    sessions.ping(&addr);

    if let Some(session) = sessions.get_by_addr(&addr) {
        tracing::trace!(
            "Ping from player {} (seq={}, count={})",
            session.player_id,
            ping.sequence,
            session.ping_count
        );
    } else {
        tracing::warn!("Ping from unknown address {}", addr);
    }

    let pong_message = ServerMessage {
        payload: Some(server_message::Payload::Pong(Pong {
            timestamp: ping.timestamp,
            sequence: ping.sequence,
            server_time: current_timestamp_ms(),
        })),
    };

    if let Err(e) = server.send(&pong_message.encode_to_vec(), addr).await {
        tracing::warn!("Failed to send pong: {}", e);
    }
}

fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
