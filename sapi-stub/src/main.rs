use std::net::SocketAddr;

use sapi_stub::Stub;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = match std::env::var("SAPI_STUB_ADDR") {
        Ok(addr) => addr.parse()?,
        Err(_) => SocketAddr::from(([0, 0, 0, 0], 80)),
    };

    let (_, server) = sapi_stub::spawn(Stub::new(), addr).await?;
    server.await?;

    Ok(())
}
