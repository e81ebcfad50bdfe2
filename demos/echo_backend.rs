//! Stand-in upstream on port 8080 that echoes what it receives.

use axum::{body::Bytes, http::{HeaderMap, Method, Uri}, routing::any, Router};
use std::net::SocketAddr;

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> String {
    let mut out = format!("{} {}\n", method, uri);
    for (name, value) in &headers {
        out.push_str(&format!("{}: {}\n", name, value.to_str().unwrap_or("<binary>")));
    }
    out.push('\n');
    out.push_str(&String::from_utf8_lossy(&body));
    out
}

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/", any(echo))
        .route("/{*path}", any(echo));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
    println!("Echo backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
