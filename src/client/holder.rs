use personal_sign_verifier::client::{sign_and_record, VerifierClient};
use personal_sign_verifier::common::config::ClientConfig;
use personal_sign_verifier::common::signer::{LocalKeySigner, MessageSigner};
use personal_sign_verifier::history::{BroadcastNotifier, FileBlobStore, HistoryStore};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: holder [sign <message> | history | clear | remove <id>]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    let history = HistoryStore::new(
        FileBlobStore::new(&config.history_dir),
        BroadcastNotifier::default(),
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("sign") => {
            let message = args[1..].join(" ");
            let signer = LocalKeySigner::load()?;
            let client = VerifierClient::new(&config.verifier_url)?;

            println!("Using verifier service at: {}", client.verify_url());
            if let Some(address) = signer.address_hint() {
                println!("Signing as: {}", address);
            }

            let response = sign_and_record(&signer, &client, &history, &message).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                let error = response
                    .error
                    .clone()
                    .unwrap_or_else(|| "Verification failed".to_string());
                return Err(match response.details_text() {
                    Some(details) => format!("{}: {}", error, details),
                    None => error,
                }
                .into());
            }
        }
        Some("history") => {
            for (index, item) in history.list().iter().enumerate() {
                let status = if item.verified { "verified" } else { "failed" };
                println!(
                    "{:>3}  {}  {:<8}  {}  {:?}",
                    index, item.timestamp, status, item.recovered_address, item.message
                );
            }
        }
        Some("clear") => {
            history.clear();
            println!("History cleared");
        }
        Some("remove") if args.len() > 1 => {
            let id = args[1..].join(" ");
            if history.remove_by_id(&id) {
                println!("Removed {}", id);
            } else {
                println!("No history item with id {}", id);
            }
        }
        _ => {
            eprintln!("{}", USAGE);
        }
    }

    Ok(())
}
