//! Static file server over the build directory.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::error::{io_err, ServerError};

/// Every request is answered from `build_dir`; directories fall back to
/// their `index.html`.
pub fn router(build_dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(build_dir).append_index_html_on_directories(true))
}

/// Bind `addr` and serve until a shutdown message arrives.
pub async fn serve(
    addr: &str,
    build_dir: PathBuf,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    let socket: SocketAddr = addr.parse().map_err(|source| ServerError::Addr {
        addr: addr.to_string(),
        source,
    })?;
    let listener = TcpListener::bind(socket)
        .await
        .map_err(|e| io_err(addr, e))?;
    serve_listener(listener, build_dir, shutdown_rx).await
}

pub async fn serve_listener(
    listener: TcpListener,
    build_dir: PathBuf,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ServerError> {
    if let Ok(local) = listener.local_addr() {
        tracing::info!("serving {} at http://{local}", build_dir.display());
    }
    axum::serve(listener, router(&build_dir))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| io_err(&build_dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn serves_build_files_and_directory_indexes() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("2021/03/hello")).unwrap();
        std::fs::write(tmp.path().join("index.html"), "home").unwrap();
        std::fs::write(tmp.path().join("2021/03/hello/index.html"), "post").unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let server = tokio::spawn(serve_listener(listener, tmp.path().to_path_buf(), shutdown_rx));

        assert!(get(addr, "/index.html").await.ends_with("home"));
        assert!(get(addr, "/2021/03/hello/").await.ends_with("post"));
        assert!(get(addr, "/missing.css").await.starts_with("HTTP/1.1 404"));

        shutdown_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bad_address_is_reported() {
        let (_tx, rx) = broadcast::channel(1);
        let err = serve("not-an-addr", PathBuf::from("build"), rx).await.unwrap_err();
        assert!(matches!(err, ServerError::Addr { .. }));
    }
}
