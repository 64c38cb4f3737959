use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use chatframe_cli::{ChatSession, ExchangeEvent, RelayClient};

const EXCHANGE_FAILED_NOTICE: &str =
    "An error occurred while sending the message. Please try again.";

/// Terminal chat client for a chatframe relay server
#[derive(Parser)]
#[command(name = "chatframe", version)]
struct Cli {
    /// Base URL of the relay server
    #[arg(long, env = "CHATFRAME_URL", default_value = "http://localhost:3000")]
    server: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let client = RelayClient::new(cli.server);
    let mut session = ChatSession::new();

    println!("{}", "chatframe".bold());
    println!("Type a message, or /models, /upload <file.pdf>, /transcript, /quit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("you>");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input == "/quit" {
            break;
        } else if input == "/models" {
            list_models(&client).await;
        } else if let Some(path) = input.strip_prefix("/upload ") {
            upload(&client, &mut session, path.trim()).await;
        } else if input == "/transcript" {
            println!("{}\n", session.transcript());
        } else if input.starts_with('/') {
            println!("{} unknown command {}", "!".yellow(), input);
        } else {
            run_exchange(&client, &mut session, input).await;
        }
    }

    Ok(())
}

fn prompt(label: &str) {
    print!("{} ", label.cyan().bold());
    let _ = std::io::stdout().flush();
}

async fn list_models(client: &RelayClient) {
    match client.models().await {
        Ok(models) if models.is_empty() => {
            println!("{} no models reported by the backend", "!".yellow());
        }
        Ok(models) => {
            for model in models {
                println!("  {model}");
            }
        }
        Err(error) => println!("{} {error}", "Error:".red().bold()),
    }
}

async fn upload(client: &RelayClient, session: &mut ChatSession, path: &str) {
    match client.upload_pdf(&PathBuf::from(path)).await {
        Ok(content) => {
            session.set_grounding(content);
            let notice =
                "PDF uploaded successfully. You can now ask questions about its content.";
            session.push_system_notice(notice);
            println!("{} {notice}", "ok".green().bold());
        }
        Err(error) => println!("{} {error}", "Error:".red().bold()),
    }
}

async fn run_exchange(client: &RelayClient, session: &mut ChatSession, input: &str) {
    session.push_user(input);
    session.begin_exchange();

    let mut exchange = client.exchange(
        session.history().to_vec(),
        session.grounding().map(str::to_string),
    );
    if let Err(error) = exchange.send().await {
        session.abort_exchange(EXCHANGE_FAILED_NOTICE);
        println!("{} {error}", "Error:".red().bold());
        return;
    }

    prompt("assistant>");
    while let Some(event) = exchange.next_event().await {
        match event {
            ExchangeEvent::Fragment(fragment) => {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
                session.apply_fragment(&fragment);
            }
            ExchangeEvent::Completed => session.complete_exchange(),
            ExchangeEvent::Aborted(reason) => {
                session.abort_exchange(EXCHANGE_FAILED_NOTICE);
                println!("\n{} {reason}", "Error:".red().bold());
            }
        }
    }
    println!();
}
