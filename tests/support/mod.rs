//! 統合テスト用のローカル HTTP サーバー
//!
//! 受け取ったリクエストのパスを記録し、決め打ちの JSON を返します。

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::sync::{
    Arc,
    Mutex,
};
use std::time::Duration;

use tokio::io::{
    AsyncReadExt,
    AsyncWriteExt,
};
use tokio::net::TcpListener;

/// 記録付きのテストサーバー
pub struct TestServer {
    /// クライアントに渡すベース URL
    pub api_url: String,
    /// 受け取ったリクエストのパス（クエリ込み）
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// 固定のレスポンスボディを返すサーバーを起動
    pub async fn spawn(body: &str) -> Self {
        Self::spawn_with_delay(body, None).await
    }

    /// レスポンスを遅延させるサーバーを起動
    pub async fn spawn_with_delay(body: &str, delay: Option<Duration>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let port = listener.local_addr().expect("local addr").port();
        let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let body = body.to_string();

        drop(tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };

                let recorded = Arc::clone(&recorded);
                let body = body.clone();

                drop(tokio::spawn(async move {
                    let mut raw = Vec::new();
                    let mut buffer = [0u8; 4096];

                    // ヘッダーの終端まで読む
                    loop {
                        let Ok(n) = socket.read(&mut buffer).await else {
                            return;
                        };
                        if n == 0 {
                            break;
                        }
                        raw.extend_from_slice(&buffer[..n]);
                        if raw.windows(4).any(|window| window == b"\r\n\r\n") {
                            break;
                        }
                    }

                    let request = String::from_utf8_lossy(&raw);
                    if let Some(path) =
                        request.lines().next().and_then(|line| line.split_whitespace().nth(1))
                    {
                        recorded.lock().expect("requests lock").push(path.to_string());
                    }

                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }

                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }));
            }
        }));

        Self { api_url: format!("http://127.0.0.1:{port}"), requests }
    }

    /// 受け取ったリクエストパスのスナップショット
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// 受け取ったリクエストの数
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}
