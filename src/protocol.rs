//! Wire messages, written out with the prost derives so the crate builds
//! without `protoc`.

pub mod client {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ClientMessage {
        #[prost(oneof = "client_message::Payload", tags = "1, 2, 3, 4")]
        pub payload: ::core::option::Option<client_message::Payload>,
    }

    pub mod client_message {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Payload {
            #[prost(message, tag = "1")]
            JoinGame(super::JoinGame),
            #[prost(message, tag = "2")]
            GameInput(super::GameInput),
            #[prost(message, tag = "3")]
            LeaveGame(super::LeaveGame),
            #[prost(message, tag = "4")]
            Ping(super::Ping),
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct JoinGame {
        #[prost(string, tag = "1")]
        pub player_name: ::prost::alloc::string::String,
    }

    /// Opaque game input; for this server an encoded `TerritoryInput`.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct GameInput {
        #[prost(bytes = "vec", tag = "1")]
        pub payload: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct LeaveGame {}

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Ping {
        #[prost(uint64, tag = "1")]
        pub timestamp: u64,
        #[prost(uint32, tag = "2")]
        pub sequence: u32,
    }
}

pub mod server {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ServerMessage {
        #[prost(oneof = "server_message::Payload", tags = "1, 2, 3, 4, 5, 6, 7")]
        pub payload: ::core::option::Option<server_message::Payload>,
    }

    pub mod server_message {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum Payload {
            #[prost(message, tag = "1")]
            Welcome(super::Welcome),
            #[prost(message, tag = "2")]
            StateUpdate(super::super::territory::StateUpdate),
            #[prost(message, tag = "3")]
            FullState(super::super::territory::FullState),
            #[prost(message, tag = "4")]
            GameOver(super::GameOver),
            #[prost(message, tag = "5")]
            Pong(super::Pong),
            #[prost(message, tag = "6")]
            Error(super::Error),
            #[prost(message, tag = "7")]
            PlayerLeft(super::PlayerLeft),
        }
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Welcome {
        #[prost(uint32, tag = "1")]
        pub player_id: u32,
        #[prost(uint32, tag = "2")]
        pub num_cols: u32,
        #[prost(uint32, tag = "3")]
        pub num_rows: u32,
        #[prost(uint32, tag = "4")]
        pub tick_rate_hz: u32,
        #[prost(uint32, tag = "5")]
        pub color: u32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct GameOver {
        #[prost(uint32, tag = "1")]
        pub winner_id: u32,
        #[prost(uint32, tag = "2")]
        pub winner_area: u32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Pong {
        #[prost(uint64, tag = "1")]
        pub timestamp: u64,
        #[prost(uint32, tag = "2")]
        pub sequence: u32,
        #[prost(uint64, tag = "3")]
        pub server_time: u64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Error {
        #[prost(string, tag = "1")]
        pub message: ::prost::alloc::string::String,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct PlayerLeft {
        #[prost(uint32, tag = "1")]
        pub player_id: u32,
    }
}

pub mod territory {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum OwnerKind {
        Empty = 0,
        Territory = 1,
        Trail = 2,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct TerritoryInput {
        /// 0 none, 1 up, 2 down, 3 left, 4 right
        #[prost(int32, tag = "1")]
        pub direction: i32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct PlayerState {
        #[prost(uint32, tag = "1")]
        pub player_id: u32,
        #[prost(int32, tag = "2")]
        pub x: i32,
        #[prost(int32, tag = "3")]
        pub y: i32,
        #[prost(uint32, tag = "4")]
        pub area: u32,
        #[prost(uint32, tag = "5")]
        pub color: u32,
        /// 0 none, 1 speed, 2 long trail
        #[prost(int32, tag = "6")]
        pub powerup: i32,
        #[prost(uint32, tag = "7")]
        pub trail_len: u32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct TileDelta {
        #[prost(int32, tag = "1")]
        pub x: i32,
        #[prost(int32, tag = "2")]
        pub y: i32,
        #[prost(enumeration = "OwnerKind", tag = "3")]
        pub kind: i32,
        #[prost(uint32, tag = "4")]
        pub owner_id: u32,
    }

    /// One board tile inside a `FullState`, row-major.
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct TileState {
        #[prost(enumeration = "OwnerKind", tag = "1")]
        pub kind: i32,
        #[prost(uint32, tag = "2")]
        pub owner_id: u32,
        #[prost(uint32, tag = "3")]
        pub age: u32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct PowerupState {
        #[prost(int32, tag = "1")]
        pub x: i32,
        #[prost(int32, tag = "2")]
        pub y: i32,
        #[prost(int32, tag = "3")]
        pub kind: i32,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct StateUpdate {
        #[prost(uint32, tag = "1")]
        pub tick: u32,
        #[prost(message, repeated, tag = "2")]
        pub players: ::prost::alloc::vec::Vec<PlayerState>,
        #[prost(message, repeated, tag = "3")]
        pub tiles: ::prost::alloc::vec::Vec<TileDelta>,
        #[prost(message, repeated, tag = "4")]
        pub powerups: ::prost::alloc::vec::Vec<PowerupState>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FullState {
        #[prost(uint32, tag = "1")]
        pub tick: u32,
        #[prost(uint32, tag = "2")]
        pub num_cols: u32,
        #[prost(uint32, tag = "3")]
        pub num_rows: u32,
        #[prost(message, repeated, tag = "4")]
        pub players: ::prost::alloc::vec::Vec<PlayerState>,
        #[prost(message, repeated, tag = "5")]
        pub tiles: ::prost::alloc::vec::Vec<TileState>,
        #[prost(message, repeated, tag = "6")]
        pub powerups: ::prost::alloc::vec::Vec<PowerupState>,
    }
}
