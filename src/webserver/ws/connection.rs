/// WebSocket connection handler
///
/// Registers the socket as a dashboard subscriber, then runs one loop that
/// drains the subscriber queue into the socket and watches the inbound
/// half for close. Inbound text is logged and otherwise ignored.
use axum::extract::ws::{Message, WebSocket};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;

use crate::arguments::is_debug_webserver_enabled;
use crate::logger::{self, LogTag};
use crate::webserver::state::AppState;

pub async fn handle_connection(socket: WebSocket, state: AppState) {
    let dashboard = Arc::clone(&state.dashboard);
    let (conn_id, mut outbound) = dashboard.connect();
    let (mut ws_tx, mut ws_rx) = socket.split();

    if is_debug_webserver_enabled() {
        logger::debug(LogTag::Webserver, &format!("Connection {} started", conn_id));
    }

    let mut sent: u64 = 0;

    loop {
        tokio::select! {
            biased;

            _ = state.shutdown.cancelled() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            message = outbound.recv() => {
                let Some(message) = message else {
                    // Registry dropped this subscriber
                    break;
                };
                if let Err(e) = forward_to_client(&mut ws_tx, &message).await {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Connection {}: failed to send message: {}", conn_id, e),
                    );
                    break;
                }
                sent += 1;
            }

            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        logger::debug(
                            LogTag::Webserver,
                            &format!("Connection {}: received '{}'", conn_id, text),
                        );
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        if is_debug_webserver_enabled() {
                            logger::debug(
                                LogTag::Webserver,
                                &format!("Connection {}: client closed", conn_id),
                            );
                        }
                        break;
                    }
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Webserver,
                            &format!("Connection {}: websocket error: {}", conn_id, e),
                        );
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    dashboard.disconnect(conn_id);

    if is_debug_webserver_enabled() {
        logger::debug(
            LogTag::Webserver,
            &format!("Connection {} closed (sent={})", conn_id, sent),
        );
    }
}

async fn forward_to_client(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    message: &str,
) -> Result<(), axum::Error> {
    ws_tx.send(Message::Text(message.to_string())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Monitor;
    use crate::config::DashboardConfig;
    use crate::dashboard::{Dashboard, HttpSample, SampleEvent};
    use crate::webserver::{bind_listener, build_app, serve};
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite, MaybeTlsStream, WebSocketStream};
    use tokio_util::sync::CancellationToken;

    type ClientSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    async fn next_topic(socket: &mut ClientSocket) -> String {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let tungstenite::Message::Text(text) = frame {
                let value: serde_json::Value = serde_json::from_str(&text).unwrap();
                return value["topic"].as_str().unwrap().to_string();
            }
        }
    }

    #[tokio::test]
    async fn test_socket_gets_greeting_then_flushes_and_unregisters_on_close() {
        let cancel = CancellationToken::new();
        let monitor = Arc::new(Monitor::with_environment(HashMap::new()));
        let dashboard = Dashboard::new(monitor.clone(), &DashboardConfig::default());
        let state = AppState::new(dashboard.clone(), monitor.clone(), cancel.clone());

        let listener = bind_listener("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(
            listener,
            build_app(state, "/metricsdash"),
            cancel.clone(),
        ));

        let (mut socket, _) = connect_async(format!("ws://{}/metricsdash", addr))
            .await
            .unwrap();
        assert_eq!(next_topic(&mut socket).await, "env");
        assert_eq!(next_topic(&mut socket).await, "title");
        assert_eq!(dashboard.registry().len(), 1);

        monitor.emit(SampleEvent::Http(HttpSample::new(1, "/api/items", 12.0)));
        dashboard.flusher().flush_once();
        assert_eq!(next_topic(&mut socket).await, "http");
        assert_eq!(next_topic(&mut socket).await, "httpURLs");

        socket.close(None).await.unwrap();
        drop(socket);

        for _ in 0..100 {
            if dashboard.registry().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(dashboard.registry().is_empty());
        assert_eq!(dashboard.registry().metrics().snapshot().total_connections, 1);

        cancel.cancel();
        server.await.unwrap().unwrap();
    }
}
