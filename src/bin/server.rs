use std::net::SocketAddr;

use parlor::server;
use parlor::{MemoryRoomStore, SqliteRoomStore, StaticAuth};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    // Demo-grade admin credentials; override them in any real deployment.
    let admin_email =
        std::env::var("PARLOR_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password =
        std::env::var("PARLOR_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let auth = StaticAuth::new().with_account(&admin_email, &admin_password, true);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));

    // PARLOR_DB selects sqlite persistence; default is in-memory.
    match std::env::var("PARLOR_DB") {
        Ok(path) => {
            let store = SqliteRoomStore::open(&path)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            tracing::info!(db = %path, "using sqlite room store");
            server::serve(store, auth, addr).await
        }
        Err(_) => server::serve(MemoryRoomStore::new(), auth, addr).await,
    }
}
