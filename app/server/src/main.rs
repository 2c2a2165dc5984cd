//! FILENAME: app/server/src/main.rs
// PURPOSE: Server entry point with unified logging.
// FORMAT: seq|level|category|message

#[tokio::main]
async fn main() {
    if let Err(e) = app_lib::run().await {
        eprintln!("[STARTUP] {}", e);
        std::process::exit(1);
    }
}
