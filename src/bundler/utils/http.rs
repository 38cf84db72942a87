//! HTTP utilities for fetching remote signing material.

use crate::bundler::error::{Error, Result};

/// Downloads a file from a URL.
///
/// Returns the file contents as a byte vector. Non-success statuses are
/// errors.
///
/// Used by:
/// - Credential setup (`CSC_LINK` and friends given as `https://` URLs)
pub async fn download(url: &str) -> Result<Vec<u8>> {
    download_with(&reqwest::Client::new(), url).await
}

/// [`download`] through a caller-supplied client.
pub async fn download_with(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    log::info!("Downloading {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| Error::GenericError(format!("Download failed: {}", e)))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::GenericError(format!("Failed to read response: {}", e)))?;

    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serves one canned response on a loopback port.
    async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/cert.p12")
    }

    fn local_client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn downloads_body() {
        let url = serve_once("200 OK", b"p12-bytes").await;
        let bytes = download_with(&local_client(), &url).await.unwrap();
        assert_eq!(bytes, b"p12-bytes");
    }

    #[tokio::test]
    async fn error_status_is_a_failure() {
        let url = serve_once("404 Not Found", b"missing").await;
        let err = download_with(&local_client(), &url).await.unwrap_err();
        assert!(err.to_string().contains("Download failed"));
    }
}
