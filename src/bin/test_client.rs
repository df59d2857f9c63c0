use prost::Message;
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;
use territory_server::config::{DEFAULT_PORT, MAX_DATAGRAM_SIZE};
use territory_server::games::territory::{
    Direction, GridPos, TerritoryConfig, TerritoryEngine, TrustMode, codec,
};
use territory_server::protocol::client::{
    ClientMessage, GameInput, JoinGame, LeaveGame,
    client_message::Payload,
};
use territory_server::protocol::server::{ServerMessage, server_message};
use territory_server::protocol::territory::TerritoryInput;

fn main() -> std::io::Result<()> {
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.set_read_timeout(Some(Duration::from_secs(2)))?;
    let server_addr = format!("127.0.0.1:{}", DEFAULT_PORT);

    // 1. Join
    let join_msg = ClientMessage {
        payload: Some(Payload::JoinGame(JoinGame {
            player_name: "Player1".to_string(),
        })),
    };
    socket.send_to(&join_msg.encode_to_vec(), &server_addr)?;
    println!("Sent: JoinGame");

    let mut board = None;
    for _ in 0..2 {
        match receive(&socket) {
            Some(server_message::Payload::Welcome(welcome)) => {
                println!("Received: Welcome {:?}", welcome);
                let mut config = TerritoryConfig::with_grid_size(welcome.num_cols, welcome.num_rows);
                config.trust = TrustMode::Networked;
                board = Some(config);
            }
            Some(server_message::Payload::FullState(state)) => {
                let Some(config) = board.clone() else { continue };
                let snapshot = codec::snapshot_from_full_state(
                    &state,
                    (config.num_cols, config.num_rows),
                    config.max_players,
                );
                match snapshot.map(|s| TerritoryEngine::from_snapshot(config, s)) {
                    Ok(Ok(engine)) => {
                        for player in engine.players() {
                            println!("Player {} at {} owns {} tiles", player.id, player.position, player.area);
                        }
                    }
                    Ok(Err(e)) => println!("Inconsistent board: {}", e),
                    Err(e) => println!("Malformed board: {}", e),
                }
            }
            Some(other) => println!("Received: {:?}", other),
            None => {}
        }
    }

    // 2. Walk a square loop out of the starting territory and back
    for (direction, ticks) in [
        (Direction::Right, 4),
        (Direction::Down, 4),
        (Direction::Left, 4),
        (Direction::Up, 4),
    ] {
        let input = TerritoryInput {
            direction: direction.to_proto(),
        };
        let msg = ClientMessage {
            payload: Some(Payload::GameInput(GameInput {
                payload: input.encode_to_vec(),
            })),
        };
        socket.send_to(&msg.encode_to_vec(), &server_addr)?;
        println!("Sent: {:?}", direction);

        for _ in 0..ticks {
            if let Some(server_message::Payload::StateUpdate(update)) = receive(&socket) {
                for player in &update.players {
                    println!(
                        "tick {}: player {} at {} area {}",
                        update.tick,
                        player.player_id,
                        GridPos::new(player.x, player.y),
                        player.area
                    );
                }
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    // 3. Leave
    let leave_msg = ClientMessage {
        payload: Some(Payload::LeaveGame(LeaveGame {})),
    };
    socket.send_to(&leave_msg.encode_to_vec(), &server_addr)?;
    println!("Done!");
    Ok(())
}

fn receive(socket: &UdpSocket) -> Option<server_message::Payload> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    match socket.recv_from(&mut buf) {
        Ok((len, _)) => match ServerMessage::decode(&buf[..len]) {
            Ok(response) => response.payload,
            Err(_) => {
                println!("Received {} bytes (failed to decode)", len);
                None
            }
        },
        Err(e) => {
            println!("No response: {}", e);
            None
        }
    }
}
