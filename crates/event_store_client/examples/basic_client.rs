use event_store_client::{EventStoreApi, config::Config, http_client::ReqwestEventStoreClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects EVENT_STORE_BASE_URL in env
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let client = ReqwestEventStoreClient::from_config(&cfg);
    let events = client.fetch_events().await?;
    for event in &events {
        println!(
            "{} {}",
            event.id.as_deref().unwrap_or("-"),
            event.title.as_deref().unwrap_or_default()
        );
    }
    println!("{} events", events.len());
    Ok(())
}
