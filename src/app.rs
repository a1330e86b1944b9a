use std::{
    io::{self, IsTerminal},
    time::Duration,
};

use anyhow::Result;
use tokio::runtime::{Builder, Handle};

use crate::{
    api::RoomApiClient,
    cli::{Cli, Command},
    domain::{self, room::CreateRoomRequest, room::Room},
    infra::{self, contracts::TokenStore, error::AppError},
    realtime::{self, transport::TransportConfig, ws::WsChannel},
    ui::{self, shell::run_room, ConsoleRenderer, LineEventSource},
    usecases::{
        self, bootstrap,
        context::AppContext,
        logout::{login_with_token, logout},
        session::ChatSession,
    },
};

/// Time given to the connection task to flush `leave_room` and the close
/// frame before the runtime stops.
const LEAVE_GRACE: Duration = Duration::from_millis(250);
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        realtime = realtime::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command {
        Command::Login { token } => {
            login_with_token(&context.tokens, &token)?;
            println!("Token saved to {}", context.tokens.token_file().display());
            Ok(())
        }
        Command::Logout => {
            let outcome = logout(&context.tokens)?;
            if outcome.token_removed {
                println!("Logged out. Stored token removed.");
            } else {
                println!("No stored token to remove.");
            }
            Ok(())
        }
        command => {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(AppError::RuntimeInit)?;
            let result = runtime.block_on(run_online(&context, command));
            // Stdin reads park a blocking thread that never returns on its own.
            runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
            result
        }
    }
}

async fn run_online(context: &AppContext, command: Command) -> Result<()> {
    let api = RoomApiClient::new(&context.config.server, context.tokens.clone())?;

    match command {
        Command::Join { room_id } => join_room(context, &api, &room_id).await,
        Command::CreateRoom { name, description } => {
            let room = api
                .create_room(&CreateRoomRequest {
                    room_name: name,
                    room_description: description,
                })
                .await?;
            print_room(&room);
            Ok(())
        }
        Command::Room { room_id } => {
            let room = api.get_room_by_id(&room_id).await?;
            print_room(&room);
            Ok(())
        }
        Command::History { room_id } => {
            let messages = api.get_chat_history(&room_id).await?;
            ConsoleRenderer::new(io::stdout(), io::stdout().is_terminal())
                .print_messages(&messages)?;
            Ok(())
        }
        Command::Login { .. } | Command::Logout => Ok(()),
    }
}

async fn join_room<T>(context: &AppContext, api: &RoomApiClient<T>, room_id: &str) -> Result<()>
where
    T: TokenStore,
{
    let token = context.tokens.token().ok_or(AppError::MissingToken)?;
    let room = api.get_room_by_id(room_id).await?;
    println!(
        "Joined {} ({}). Type to chat; /who, /history, /clear, /quit.",
        room.room_name, room.short_room_id
    );

    let (channel, mut signals) = WsChannel::new(Handle::current());
    let config = TransportConfig::new(&context.config.server, &context.config.transport);
    let mut session = ChatSession::open(config, room_id, &token, channel);
    let mut events = LineEventSource::stdin();
    let mut console = ConsoleRenderer::new(io::stdout(), io::stdout().is_terminal());

    run_room(
        &mut session,
        api,
        &mut events,
        &mut signals,
        &mut console,
        async {
            let _ = tokio::signal::ctrl_c().await;
        },
    )
    .await?;

    drop(session);
    tokio::time::sleep(LEAVE_GRACE).await;
    Ok(())
}

fn print_room(room: &Room) {
    for line in describe_room(room) {
        println!("{line}");
    }
}

fn describe_room(room: &Room) -> Vec<String> {
    let mut lines = vec![
        format!("{} [{}]", room.room_name, room.short_room_id),
        format!("  id:      {}", room.room_id),
    ];
    if !room.room_description.is_empty() {
        lines.push(format!("  about:   {}", room.room_description));
    }
    lines.push(format!(
        "  access:  {}",
        if room.is_private { "private" } else { "public" }
    ));
    lines.push(format!("  created: {} by user {}", room.created_at, room.created_by));
    lines
}
