mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
    time::{Instant, MissedTickBehavior},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    engine::{Engine, EngineBuilder},
    scenario::Scenario,
    world::{FrameSnapshot, InputEvent, World},
};

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub frame: Option<FrameSnapshot>,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    inputs: mpsc::UnboundedSender<InputEvent>,
    latest_frame: Arc<Mutex<Option<FrameSnapshot>>>,
    scenario_name: String,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub snapshot_interval: Option<u64>,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        snapshot_interval,
        snapshot_dir,
        host,
        port,
    } = config;

    let world = scenario.build_world()?;
    let engine = EngineBuilder::new(scenario.engine_settings(snapshot_interval, snapshot_dir))
        .with_garden_systems()
        .build();

    let (tx, _) = broadcast::channel::<String>(64);
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let latest_frame: Arc<Mutex<Option<FrameSnapshot>>> = Arc::new(Mutex::new(None));

    let frame_ms = scenario.frame_ms;
    let frames_tx = tx.clone();
    let latest_for_sim = latest_frame.clone();
    let sim = tokio::spawn(async move {
        if let Err(err) =
            frame_loop(engine, world, frame_ms, input_rx, frames_tx, latest_for_sim).await
        {
            log::error!("frame loop stopped: {err:?}");
        }
    });

    let state = Arc::new(AppState {
        broadcaster: tx,
        inputs: input_tx,
        latest_frame,
        scenario_name: scenario.name.clone(),
    });

    let router = Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/events", get(stream_events))
        .route("/api/input", post(push_input))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    log::info!("garden '{}' live at http://{addr} (Ctrl+C to stop)", scenario.name);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sim.abort();
    Ok(())
}

/// Owns the engine and world; input arrives over the channel and every
/// frame is published to SSE subscribers.
async fn frame_loop(
    mut engine: Engine,
    mut world: World,
    frame_ms: f64,
    mut inputs: mpsc::UnboundedReceiver<InputEvent>,
    frames: broadcast::Sender<String>,
    latest: Arc<Mutex<Option<FrameSnapshot>>>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(frame_ms / 1_000.0));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let elapsed_ms = now.duration_since(last).as_secs_f64() * 1_000.0;
        last = now;

        while let Ok(event) = inputs.try_recv() {
            world.queue_input(event);
        }
        engine.frame(&mut world, elapsed_ms)?;

        let snapshot = world.snapshot(engine.scenario_name(), false);
        let payload = serde_json::to_string(&snapshot)?;
        *latest.lock().expect("latest frame lock poisoned") = Some(snapshot);
        // no subscribers is fine
        let _ = frames.send(payload);
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("shutting down garden");
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], assets::STYLES_CSS)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let frame = state
        .latest_frame
        .lock()
        .expect("latest frame lock poisoned")
        .clone();
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        frame,
    })
}

async fn push_input(
    State(state): State<Arc<AppState>>,
    Json(event): Json<InputEvent>,
) -> StatusCode {
    match state.inputs.send(event) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => {
            log::warn!("dropping {event:?}: frame loop is not running");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
