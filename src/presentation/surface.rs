/// Playback surface and asset catalog seams
///
/// The state machine issues start/stop/fade instructions through
/// [`PlaybackSurface`] but never owns media resources or renders anything
/// itself; the surface (UI layer, audio engine) does. Asset ids are resolved
/// through [`AssetCatalog`], a synchronous lookup against a collaborator-owned
/// cache; unknown ids make the command a silent partial no-op.
use std::collections::HashMap;
use std::time::Duration;

use crate::protocol::AssetId;

/// Opaque handle to a loaded audio resource owned by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

/// Opaque handle to a loaded image resource owned by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Resolved audio asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioAsset {
    /// Background tracks loop and participate in crossfade bookkeeping;
    /// everything else is a one-shot effect played to completion.
    pub is_bgm: bool,
    pub handle: AudioHandle,
}

/// Resolved image asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageAsset {
    pub handle: ImageHandle,
}

/// One of the two image slots used for crossfading.
///
/// Exactly one slot is the visible target at a time; the other holds the
/// previous image mid-fade-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    A,
    B,
}

impl ImageSlot {
    pub fn other(self) -> Self {
        match self {
            ImageSlot::A => ImageSlot::B,
            ImageSlot::B => ImageSlot::A,
        }
    }
}

/// Synchronous asset lookups against a collaborator-owned cache
pub trait AssetCatalog {
    fn audio(&self, id: AssetId) -> Option<AudioAsset>;
    fn image(&self, id: AssetId) -> Option<ImageAsset>;
}

/// Instructions the presentation state machine issues to the rendering /
/// audio layer. Implementations own the actual media resources; fade calls
/// start time-bounded ramps that the surface runs on its own scheduler, each
/// cancellable per resource instance.
pub trait PlaybackSurface {
    // Audio tracks
    fn play_one_shot(&mut self, handle: AudioHandle);
    fn fade_in_audio(&mut self, handle: AudioHandle, fade: Duration);
    fn fade_out_audio(&mut self, handle: AudioHandle, fade: Duration);
    /// Cancel an in-flight fade ramp, leaving volume where it is
    fn cancel_audio_fade(&mut self, handle: AudioHandle);
    fn stop_audio(&mut self, handle: AudioHandle);
    /// Whether the track is still audibly playing (used to sweep finished
    /// fade-outs)
    fn audio_playing(&self, handle: AudioHandle) -> bool;

    // Image slots
    fn assign_image(&mut self, slot: ImageSlot, handle: ImageHandle);
    fn fade_in_slot(&mut self, slot: ImageSlot, fade: Duration);
    fn fade_out_slot(&mut self, slot: ImageSlot, fade: Duration);
    /// Cancel any pending slot fade ramps (both slots)
    fn cancel_slot_fades(&mut self);
    fn set_slot_opacity(&mut self, slot: ImageSlot, opacity: f32);
    fn slot_opacity(&self, slot: ImageSlot) -> f32;

    // Caption text
    fn show_text(&mut self, text: &str);
    fn clear_text(&mut self);

    // Timer panel and its sounds
    fn show_timer(&mut self, seconds: u64);
    fn update_timer(&mut self, seconds: u64);
    fn hide_timer(&mut self);
    fn play_timer_tick(&mut self);
    fn stop_timer_tick(&mut self);
    fn play_timer_ended(&mut self);
    fn stop_timer_ended(&mut self);

    // Waiting screen, dismissed once per session on the first command
    fn reveal_stage(&mut self);
    fn fade_out_waiting(&mut self, fade: Duration);
}

/// In-memory asset catalog.
///
/// The real catalog belongs to the session's asset loader; this one backs the
/// headless binary and tests.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    audio: HashMap<AssetId, AudioAsset>,
    images: HashMap<AssetId, ImageAsset>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_audio(&mut self, id: AssetId, is_bgm: bool, handle: AudioHandle) {
        self.audio.insert(id, AudioAsset { is_bgm, handle });
    }

    pub fn insert_image(&mut self, id: AssetId, handle: ImageHandle) {
        self.images.insert(id, ImageAsset { handle });
    }
}

impl AssetCatalog for MemoryCatalog {
    fn audio(&self, id: AssetId) -> Option<AudioAsset> {
        self.audio.get(&id).copied()
    }

    fn image(&self, id: AssetId) -> Option<ImageAsset> {
        self.images.get(&id).copied()
    }
}
