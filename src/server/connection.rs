// Connection handling module
// One spawned task per accepted TCP connection

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Resolves once the shutdown flag is raised
pub async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}

/// Count the connection and serve it in its own task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter, decremented when the task ends
/// * `shutdown` - Shutdown flag; a raised flag closes keep-alive connections
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: watch::Receiver<bool>,
) {
    conn_counter.fetch_add(1, Ordering::SeqCst);
    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        shutdown,
    );
}

fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        // Bounds the wait for the next request's headers (idle keep-alive
        // included), never a request already being handled
        let idle_timeout = Duration::from_secs(state.config.server.connection_timeout_secs);

        let conn = http1::Builder::new()
            .timer(TokioTimer::new())
            .header_read_timeout(idle_timeout)
            .keep_alive(true)
            .serve_connection(
                io,
                service_fn(move |req| {
                    handler::handle_request(req, Arc::clone(&state), peer_addr)
                }),
            );
        tokio::pin!(conn);

        let mut stopping = false;
        let result = loop {
            tokio::select! {
                result = conn.as_mut() => break result,
                () = stopped(&mut shutdown), if !stopping => {
                    // Finish the in-flight request, then close instead of keeping alive
                    stopping = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_timeout() => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} closed after {} seconds without a request",
                    idle_timeout.as_secs()
                ));
            }
            Err(err) => logger::log_connection_error(&err),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
