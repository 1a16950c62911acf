use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use survey_web::http::from_outgoing;
use survey_web::settings::Settings;
use survey_web::state::AppState;
use survey_web::store::SurveyStore;
use survey_web::{logger, pipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = settings.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(serve(settings))
}

async fn serve(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = settings.socket_addr()?;
    let listener = create_reusable_listener(addr)?;

    let surveys = match SurveyStore::load(&settings.app.surveys_file) {
        Ok(store) => store,
        Err(e) => {
            logger::log_warning(&format!("{e}; starting with no surveys"));
            SurveyStore::from_surveys(Vec::new())
        }
    };

    let state = Arc::new(AppState::new(settings, surveys));
    logger::log_server_start(&addr, &state.settings);

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                handle_connection(stream, peer_addr, Arc::clone(&state));
            }
            Err(e) => {
                logger::log_error(&format!("Failed to accept connection: {e}"));
            }
        }
    }
}

/// Serve one connection in a spawned task, with keep-alive and a
/// connection timeout from the performance settings.
fn handle_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: Arc<AppState>) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let keep_alive = state.settings.performance.keep_alive_timeout > 0;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            state.settings.performance.read_timeout,
            state.settings.performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let svc_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&svc_state);
                async move { handle_request(req, &state, peer_addr).await }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {} seconds",
                timeout_duration.as_secs()
            )),
        }
    });
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    state: &AppState,
    peer_addr: SocketAddr,
) -> Result<hyper::Response<http_body_util::Full<hyper::body::Bytes>>, Infallible> {
    let server_name = state.settings.http.server_name.clone();
    let outgoing = match pipeline::from_hyper(
        req,
        Some(peer_addr),
        state.settings.http.max_body_size,
    )
    .await
    {
        Ok(ctx) => pipeline::handle(ctx, state).await,
        Err(early) => early,
    };
    Ok(from_outgoing(outgoing, &server_name))
}

/// Create a `TcpListener` with `SO_REUSEPORT` and `SO_REUSEADDR` enabled,
/// so restarts can rebind the port without waiting out TIME_WAIT.
fn create_reusable_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
