use chrono::Utc;
use clap::Parser;
use connectly_sync::net::UreqHttpClient;
use connectly_sync::socket::WebSocketTransportFactory;
use connectly_sync::types::user::{Credentials, UserId};
use connectly_sync::{Client, Config};
use log::{error, info};
use std::sync::Arc;

// Listen-only demo: sign in with an existing token, print the chat list, and
// stream incoming messages until ctrl-c.
//
// Usage:
//   cargo run -- --token <TOKEN> --user <USER_ID>
//   cargo run -- --token <TOKEN> --user <USER_ID> --chat <CHAT_ID>

#[derive(Parser, Debug)]
#[command(name = "connectly-sync", about = "Chat synchronization demo client")]
struct Args {
    /// Bearer token for the API and the push channel
    #[arg(long)]
    token: String,

    /// Identity of the signed-in user
    #[arg(long)]
    user: String,

    /// Open this conversation and print its messages
    #[arg(long)]
    chat: Option<String>,

    /// Override the REST endpoint
    #[arg(long)]
    api_url: Option<String>,

    /// Override the push channel endpoint
    #[arg(long)]
    socket_url: Option<String>,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Utc::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    rt.block_on(async {
        let mut config = Config::default();
        if let Some(api_url) = args.api_url {
            config.api_base_url = api_url;
        }
        if let Some(socket_url) = args.socket_url {
            config.socket_url = socket_url;
        }

        let transport_factory = Arc::new(WebSocketTransportFactory::new(config.socket_url.clone()));
        let http_client = Arc::new(UreqHttpClient::new());
        let client = Client::new(config, transport_factory, http_client);

        client
            .set_credentials(Credentials {
                token: args.token,
                user_id: UserId::new(args.user),
            })
            .await;

        if let Err(e) = client.connect().await {
            error!("Connect failed: {e}");
            return;
        }

        if let Err(e) = client.refresh_chats().await {
            error!("Chat list fetch failed: {e}");
            return;
        }
        for chat in client.chats().await {
            let preview = chat
                .last_message
                .as_ref()
                .map(|m| m.text.clone())
                .unwrap_or_else(|| "No messages yet".to_string());
            info!("{} — {}: {}", chat.id, chat.other_user.name, preview);
        }

        if let Some(chat_id) = args.chat {
            if let Err(e) = client.open_chat(chat_id.clone()).await {
                error!("Could not open chat {chat_id}: {e}");
                return;
            }
            for message in client.messages().await {
                let marker = match client.receipt_status(&message).await {
                    Some(status) => format!(" [{status:?}]"),
                    None => String::new(),
                };
                info!("{} {}: {}{}", message.created_at, message.sender, message.text, marker);
            }
        }

        let mut messages = client.event_bus.message.subscribe();
        let mut activity = client.event_bus.chat_activity.subscribe();
        info!("Listening for activity; ctrl-c to exit");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                Ok(message) = messages.recv() => {
                    info!("{}: {}", message.sender, message.text);
                }
                Ok(event) = activity.recv() => {
                    info!("Activity in chat {}", event.chat_id);
                }
            }
        }

        client.disconnect().await;
        info!("Bye");
    });
}
