// tests/common/mod.rs
// Shared helpers: in-process HTTP servers bound to an ephemeral local port.
#![allow(dead_code)]

use axum::Router;

pub const TECH_XML: &str = include_str!("../fixtures/tech_rss.xml");
pub const WORLD_XML: &str = include_str!("../fixtures/world_rss.xml");

/// Serve `app` on 127.0.0.1:0 and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}
