#[tokio::main]
async fn main() {
    if let Err(err) = quickfile_mcp::mcp::server::run_stdio().await {
        eprintln!("quickfile-mcp: {}", err);
        std::process::exit(1);
    }
}
