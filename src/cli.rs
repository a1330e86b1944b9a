use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "roomchat", about = "Terminal client for collaborative chat rooms")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Join a room: live chat and presence on the console
    Join { room_id: String },
    /// Create a new room
    CreateRoom {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show room details
    Room { room_id: String },
    /// Print the stored chat history of a room
    History { room_id: String },
    /// Store a bearer token for later sessions
    Login {
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
}
