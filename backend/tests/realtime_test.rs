use std::time::Duration;

use crazedash_backend::app;
use crazedash_backend::test_util::{create_test_state, test_config};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = create_test_state(test_config());

    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });

    format!("ws://{}/ws", addr)
}

async fn next_event(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(10), client.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Read events until one named `event` matches `pred`.
async fn wait_for<F>(client: &mut Client, event: &str, pred: F) -> Value
where
    F: Fn(&Value) -> bool,
{
    loop {
        let frame = next_event(client).await;
        if frame["event"] == event && pred(&frame["data"]) {
            return frame["data"].clone();
        }
    }
}

#[tokio::test]
async fn test_server_list_sent_on_connect() {
    let url = start_server().await;
    let (mut client, _) = connect_async(url).await.unwrap();

    let frame = next_event(&mut client).await;
    assert_eq!(
        frame,
        json!({
            "event": "servers",
            "data": [
                {"id": "srv1", "name": "Survival Server", "status": "online"},
                {"id": "srv2", "name": "Creative Server", "status": "offline"}
            ]
        })
    );
}

#[tokio::test]
async fn test_console_join_streams_logs() {
    let url = start_server().await;
    let (mut client, _) = connect_async(url).await.unwrap();
    next_event(&mut client).await;

    client
        .send(Message::Text(json!({"event": "joinConsole", "data": "srv2"}).to_string()))
        .await
        .unwrap();

    let data = wait_for(&mut client, "consoleLog", |d| d["srvId"] == "srv2").await;
    let line = data["line"].as_str().unwrap();
    assert!(line.starts_with("[Server] Demo log line at "), "{}", line);
}

#[tokio::test]
async fn test_console_command_is_echoed() {
    let url = start_server().await;
    let (mut client, _) = connect_async(url).await.unwrap();
    next_event(&mut client).await;

    // Garbage must not close the connection
    client.send(Message::Text("not json".to_string())).await.unwrap();

    client
        .send(Message::Text(
            json!({"event": "consoleCmd", "data": {"srvId": "srv1", "command": "say hi"}})
                .to_string(),
        ))
        .await
        .unwrap();

    let data = wait_for(&mut client, "consoleLog", |d| d["line"] == "[You]: say hi").await;
    assert_eq!(data["srvId"], "srv1");
}

#[tokio::test]
async fn test_status_updates_flip_srv1() {
    let url = start_server().await;
    let (mut client, _) = connect_async(url).await.unwrap();
    next_event(&mut client).await;

    let data = wait_for(&mut client, "statusUpdate", |_| true).await;
    assert_eq!(data["id"], "srv1");
    let status = data["status"].as_str().unwrap();
    assert!(status == "online" || status == "offline");
}
