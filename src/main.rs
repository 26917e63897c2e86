/// stagelink headless player binary
///
/// Joins a session as the player and renders incoming commands to the log.
/// The real stage renderer plugs in by replacing [`LoggingSurface`] with a
/// surface backed by an actual audio/video stack; everything else in the
/// loop stays the same.
use std::time::{Duration, Instant};

use stagelink::config::Config;
use stagelink::connection::{ConnectionManager, WsTransport};
use stagelink::error::AppResult;
use stagelink::messaging::EventQueue;
use stagelink::presentation::surface::{
    AudioHandle, ImageHandle, ImageSlot, MemoryCatalog, PlaybackSurface,
};
use stagelink::presentation::{FadeTimings, PresentationStateMachine};
use stagelink::protocol::SessionCode;

/// Cadence of the drain/tick loop
const TICK_INTERVAL: Duration = Duration::from_millis(33);

fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Logs live next to the executable, like the config directory
    let log_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("logs")))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    // Daily rotation keeps long-running sessions from growing one file
    let file_appender = rolling::daily(&log_dir, "stagelink.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    // In debug builds, also log to console
    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

/// Surface that narrates every instruction instead of rendering it
#[derive(Default)]
struct LoggingSurface {
    opacity: [f32; 2],
    playing: std::collections::HashSet<u64>,
}

impl LoggingSurface {
    fn slot_index(slot: ImageSlot) -> usize {
        match slot {
            ImageSlot::A => 0,
            ImageSlot::B => 1,
        }
    }
}

impl PlaybackSurface for LoggingSurface {
    fn play_one_shot(&mut self, handle: AudioHandle) {
        tracing::info!("[stage] sound effect {handle:?}");
    }

    fn fade_in_audio(&mut self, handle: AudioHandle, fade: Duration) {
        self.playing.insert(handle.0);
        tracing::info!("[stage] fade in track {handle:?} over {fade:?}");
    }

    fn fade_out_audio(&mut self, handle: AudioHandle, fade: Duration) {
        self.playing.remove(&handle.0);
        tracing::info!("[stage] fade out track {handle:?} over {fade:?}");
    }

    fn cancel_audio_fade(&mut self, handle: AudioHandle) {
        tracing::debug!("[stage] cancel fade on track {handle:?}");
    }

    fn stop_audio(&mut self, handle: AudioHandle) {
        self.playing.remove(&handle.0);
        tracing::info!("[stage] stop track {handle:?}");
    }

    fn audio_playing(&self, handle: AudioHandle) -> bool {
        self.playing.contains(&handle.0)
    }

    fn assign_image(&mut self, slot: ImageSlot, handle: ImageHandle) {
        tracing::info!("[stage] slot {slot:?} now holds image {handle:?}");
    }

    fn fade_in_slot(&mut self, slot: ImageSlot, fade: Duration) {
        self.opacity[Self::slot_index(slot)] = 1.0;
        tracing::info!("[stage] fade in slot {slot:?} over {fade:?}");
    }

    fn fade_out_slot(&mut self, slot: ImageSlot, fade: Duration) {
        self.opacity[Self::slot_index(slot)] = 0.0;
        tracing::info!("[stage] fade out slot {slot:?} over {fade:?}");
    }

    fn cancel_slot_fades(&mut self) {
        tracing::debug!("[stage] cancel slot fades");
    }

    fn set_slot_opacity(&mut self, slot: ImageSlot, opacity: f32) {
        self.opacity[Self::slot_index(slot)] = opacity;
    }

    fn slot_opacity(&self, slot: ImageSlot) -> f32 {
        self.opacity[Self::slot_index(slot)]
    }

    fn show_text(&mut self, text: &str) {
        tracing::info!("[stage] caption: {text}");
    }

    fn clear_text(&mut self) {
        tracing::info!("[stage] caption cleared");
    }

    fn show_timer(&mut self, seconds: u64) {
        tracing::info!("[stage] timer shown at {seconds}s");
    }

    fn update_timer(&mut self, seconds: u64) {
        tracing::debug!("[stage] timer {seconds}s");
    }

    fn hide_timer(&mut self) {
        tracing::info!("[stage] timer hidden");
    }

    fn play_timer_tick(&mut self) {
        tracing::debug!("[stage] tick sound on");
    }

    fn stop_timer_tick(&mut self) {
        tracing::debug!("[stage] tick sound off");
    }

    fn play_timer_ended(&mut self) {
        tracing::info!("[stage] timer ended sound");
    }

    fn stop_timer_ended(&mut self) {
        tracing::debug!("[stage] ended sound off");
    }

    fn reveal_stage(&mut self) {
        tracing::info!("[stage] stage revealed");
    }

    fn fade_out_waiting(&mut self, fade: Duration) {
        tracing::info!("[stage] waiting screen fading out over {fade:?}");
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    initialize_tracing();

    let session = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: stagelink <session-code>"))?;
    let session = SessionCode::new(session);

    let config = Config::load()?;
    tracing::info!(hub = %config.hub_url, session = %session, "Starting stagelink player");

    let queue = EventQueue::new();
    let transport = WsTransport::new(config.hub_url.clone(), config.reconnect_attempts);
    let manager = ConnectionManager::with_queue(session, transport, queue.clone(), &config);

    if !manager.connect().await? {
        // The failure status is already drained below; give the log a
        // moment and bail
        for entry in queue.drain_all() {
            tracing::error!("Startup event: {}", entry.event.description());
        }
        anyhow::bail!("could not join the session");
    }

    let mut machine = PresentationStateMachine::new(FadeTimings::from_config(&config));
    let mut surface = LoggingSurface::default();
    let catalog = MemoryCatalog::new();

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                for entry in queue.drain_all() {
                    machine.handle_entry(&entry, now, &mut surface, &catalog);
                }
                machine.tick(now, &mut surface);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    machine.shutdown(&mut surface);
    if let Err(e) = manager.stop().await {
        tracing::warn!("Graceful stop failed: {e}");
    }
    manager.dispose();
    queue.close();
    tracing::info!("Goodbye");
    Ok(())
}
