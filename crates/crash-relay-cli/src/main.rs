use crash_relay_cli::run_cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}
