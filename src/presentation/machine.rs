/// Presentation state machine
///
/// Consumes drained queue events on the single presentation thread and
/// mutates audio/image/text/timer state, issuing fade and playback
/// instructions to the surface. Runs only inside the consumer loop, so none
/// of this needs locking.
use std::time::{Duration, Instant};

use super::audio::AudioPlaybackState;
use super::image::ImagePresentationState;
use super::surface::{AssetCatalog, PlaybackSurface};
use super::timer::CountdownTimer;
use crate::config::Config;
use crate::messaging::{QueueEntry, QueueEvent};
use crate::protocol::{CommandPayload, ConnectionStatus, PredefinedPayload, StatusEvent};

/// Fade and linger timings, lifted out of [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct FadeTimings {
    /// Crossfade duration for background tracks, both directions
    pub audio_fade: Duration,
    pub image_fade_in: Duration,
    pub image_fade_out: Duration,
    /// Seconds the ended timer stays on screen after zero
    pub timer_linger_secs: u64,
}

impl FadeTimings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            audio_fade: config.audio_fade(),
            image_fade_in: config.image_fade_in(),
            image_fade_out: config.image_fade_out(),
            timer_linger_secs: config.timer_linger_secs,
        }
    }
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

type StatusHandler = Box<dyn FnMut(&StatusEvent) + Send>;

pub struct PresentationStateMachine {
    audio: AudioPlaybackState,
    image: ImagePresentationState,
    timer: Option<CountdownTimer>,
    timings: FadeTimings,

    /// Set once by the first (predefined or regular) command of a session;
    /// dismisses the waiting screen exactly once
    received_first_command: bool,

    status_handler: Option<StatusHandler>,
}

impl PresentationStateMachine {
    pub fn new(timings: FadeTimings) -> Self {
        Self {
            audio: AudioPlaybackState::new(),
            image: ImagePresentationState::new(),
            timer: None,
            timings,
            received_first_command: false,
            status_handler: None,
        }
    }

    /// Register the upward status surface (UI banner / logging collaborator)
    pub fn set_status_handler(&mut self, handler: StatusHandler) {
        self.status_handler = Some(handler);
    }

    /// Process one drained queue entry
    pub fn handle_entry(
        &mut self,
        entry: &QueueEntry,
        now: Instant,
        surface: &mut dyn PlaybackSurface,
        catalog: &dyn AssetCatalog,
    ) {
        tracing::debug!(
            order = entry.arrival_order,
            "Applying {}",
            entry.event.description()
        );
        match &entry.event {
            QueueEvent::Command(cmd) => self.apply_command(cmd, now, surface, catalog),
            QueueEvent::Predefined(p) => self.apply_predefined(p, surface),
            QueueEvent::Status(status) => self.handle_status(status),
        }
    }

    /// Apply a content-bearing command: timer, audio, image, then text.
    /// Text comes last because its clear-on-empty fallback depends on
    /// whether this same command carried an image.
    pub fn apply_command(
        &mut self,
        cmd: &CommandPayload,
        now: Instant,
        surface: &mut dyn PlaybackSurface,
        catalog: &dyn AssetCatalog,
    ) {
        self.first_command_gate(surface);

        self.apply_timer(cmd, now, surface);
        self.apply_audio(cmd, surface, catalog);
        self.apply_image(cmd, surface, catalog);
        self.apply_text(cmd, surface);
    }

    /// Apply a predefined reset burst. The three gates are independent and
    /// each is a no-op when its target is already in the reset state.
    pub fn apply_predefined(&mut self, p: &PredefinedPayload, surface: &mut dyn PlaybackSurface) {
        self.first_command_gate(surface);

        if p.stop_sound_effects() {
            if let Some(timer) = self.timer.take() {
                timer.cancel(surface);
            } else {
                surface.stop_timer_tick();
                surface.stop_timer_ended();
                surface.hide_timer();
            }
        }

        if p.clear_screen() {
            self.image.clear(self.timings.image_fade_out, surface);
            surface.clear_text();
        }

        if p.stop_bgm() {
            self.audio.stop_bgm(self.timings.audio_fade, surface);
        }
    }

    /// Advance timers and sweep finished fade-outs. Called once per consumer
    /// tick after the drain.
    pub fn tick(&mut self, now: Instant, surface: &mut dyn PlaybackSurface) {
        if let Some(timer) = &mut self.timer {
            if timer.tick(now, surface) {
                self.timer = None;
            }
        }
        self.audio.clean_fade_outs(None, surface);
    }

    /// Forget the first-command gate for a fresh session (full reconnect of
    /// a new session, not an automatic transport reconnect)
    pub fn reset_session(&mut self) {
        self.received_first_command = false;
    }

    /// Session teardown: hard-stop all playback without fades. The stage is
    /// going away, so nothing waits for a ramp.
    pub fn shutdown(&mut self, surface: &mut dyn PlaybackSurface) {
        if let Some(timer) = self.timer.take() {
            timer.cancel(surface);
        }
        self.audio.halt(surface);
    }

    // Accessors used by the UI layer and tests

    pub fn current_bgm(&self) -> Option<crate::protocol::AssetId> {
        self.audio.current_id()
    }

    pub fn shown_image(&self) -> Option<crate::protocol::AssetId> {
        self.image.shown_id()
    }

    pub fn timer_remaining(&self) -> Option<u64> {
        self.timer.as_ref().map(|t| t.remaining())
    }

    pub fn received_first_command(&self) -> bool {
        self.received_first_command
    }

    pub fn audio_invariant_holds(&self) -> bool {
        self.audio.invariant_holds()
    }

    fn first_command_gate(&mut self, surface: &mut dyn PlaybackSurface) {
        if !self.received_first_command {
            self.received_first_command = true;
            surface.reveal_stage();
            surface.fade_out_waiting(self.timings.audio_fade);
        }
    }

    fn apply_timer(&mut self, cmd: &CommandPayload, now: Instant, surface: &mut dyn PlaybackSurface) {
        let Some(seconds) = cmd.timer else { return };
        if seconds == 0 {
            return;
        }

        // A running countdown is cancelled before the replacement starts
        if let Some(previous) = self.timer.take() {
            previous.cancel(surface);
        }
        self.timer = Some(CountdownTimer::start(
            seconds,
            self.timings.timer_linger_secs,
            now,
            surface,
        ));
    }

    fn apply_audio(
        &mut self,
        cmd: &CommandPayload,
        surface: &mut dyn PlaybackSurface,
        catalog: &dyn AssetCatalog,
    ) {
        // Only the first background id of a command wins; effects all fire
        let mut got_bgm = false;

        for id in &cmd.audio_ids {
            let Some(asset) = catalog.audio(*id) else {
                tracing::debug!("Unknown audio asset {id}, ignoring");
                continue;
            };

            if !asset.is_bgm {
                tracing::debug!("Playing sound effect {id}");
                surface.play_one_shot(asset.handle);
            } else if !got_bgm {
                got_bgm = true;
                self.audio
                    .play_bgm(*id, asset.handle, self.timings.audio_fade, surface);
            }
        }
    }

    fn apply_image(
        &mut self,
        cmd: &CommandPayload,
        surface: &mut dyn PlaybackSurface,
        catalog: &dyn AssetCatalog,
    ) {
        let Some(id) = cmd.image_id else { return };
        let Some(asset) = catalog.image(id) else {
            tracing::debug!("Unknown image asset {id}, ignoring");
            return;
        };

        self.image.show(
            id,
            asset.handle,
            self.timings.image_fade_in,
            self.timings.image_fade_out,
            surface,
        );
    }

    fn apply_text(&mut self, cmd: &CommandPayload, surface: &mut dyn PlaybackSurface) {
        match cmd.text.as_deref() {
            Some(text) if !text.is_empty() => surface.show_text(text),
            _ => {
                // An image-only command turns the caption off
                if cmd.image_id.is_some() {
                    surface.clear_text();
                }
            }
        }
    }

    fn handle_status(&mut self, status: &StatusEvent) {
        match status.status {
            ConnectionStatus::Disconnected | ConnectionStatus::FailedToConnect => {
                tracing::error!(detail = ?status.detail, "Connection status: {:?}", status.status);
            }
            ConnectionStatus::Reconnecting | ConnectionStatus::InvokeFailed => {
                tracing::warn!(detail = ?status.detail, "Connection status: {:?}", status.status);
            }
            _ => {
                tracing::info!("Connection status: {:?}", status.status);
            }
        }

        if let Some(handler) = &mut self.status_handler {
            handler(status);
        }
    }
}
