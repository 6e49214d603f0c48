use ipfs_deploy::cli::run_cli;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    if let Err(e) = run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
