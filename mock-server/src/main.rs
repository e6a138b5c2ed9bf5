use tokio::net::TcpListener;

/// Serves the pipeline test API. `HOST` and `PORT` pick the bind address.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock api listening on http://{addr}");
    for route in ["/api/items/{id}", "/api/hits", "/api/echo", "/api/broken", "/api/text", "/api/large"] {
        println!("  {route}");
    }
    mock_server::run(listener).await
}
