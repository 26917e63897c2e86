/// Recording playback surface used by unit tests.
///
/// Applies fades instantly (fade-in ⇒ fully visible/audible, fade-out ⇒
/// opacity zero) and records every instruction so tests can assert on what
/// the state machine asked for. `finish_audio` simulates a track's playback
/// ending naturally.
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::surface::{AudioHandle, ImageHandle, ImageSlot, PlaybackSurface};

fn slot_index(slot: ImageSlot) -> usize {
    match slot {
        ImageSlot::A => 0,
        ImageSlot::B => 1,
    }
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    one_shots: Vec<AudioHandle>,
    audio_fade_ins: Vec<AudioHandle>,
    audio_fade_outs: Vec<AudioHandle>,
    audio_fade_cancels: Vec<AudioHandle>,
    playing: HashSet<AudioHandle>,

    assigned: HashMap<usize, ImageHandle>,
    slot_opacity: [f32; 2],
    slot_fade_ins: [usize; 2],
    slot_fade_outs: [usize; 2],
    slot_fade_cancels: usize,

    text: Option<String>,

    timer_visible: bool,
    timer_last_shown: Option<u64>,
    timer_updates: Vec<u64>,
    tick_playing: bool,
    tick_plays: usize,
    ended_plays: usize,

    stage_revealed: bool,
    waiting_fades: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    // Test helpers / accessors

    pub fn finish_audio(&mut self, handle: AudioHandle) {
        self.playing.remove(&handle);
    }

    pub fn one_shot_count(&self, handle: AudioHandle) -> usize {
        self.one_shots.iter().filter(|h| **h == handle).count()
    }

    pub fn fade_in_audio_count(&self, handle: AudioHandle) -> usize {
        self.audio_fade_ins.iter().filter(|h| **h == handle).count()
    }

    pub fn fade_out_audio_count(&self, handle: AudioHandle) -> usize {
        self.audio_fade_outs.iter().filter(|h| **h == handle).count()
    }

    pub fn cancel_audio_fade_count(&self, handle: AudioHandle) -> usize {
        self.audio_fade_cancels.iter().filter(|h| **h == handle).count()
    }

    pub fn assigned_image(&self, slot: ImageSlot) -> Option<ImageHandle> {
        self.assigned.get(&slot_index(slot)).copied()
    }

    pub fn fade_in_slot_count(&self, slot: ImageSlot) -> usize {
        self.slot_fade_ins[slot_index(slot)]
    }

    pub fn fade_out_slot_count(&self, slot: ImageSlot) -> usize {
        self.slot_fade_outs[slot_index(slot)]
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn timer_shown(&self) -> Option<u64> {
        self.timer_last_shown
    }

    pub fn timer_hidden(&self) -> bool {
        !self.timer_visible
    }

    pub fn timer_updates(&self) -> Vec<u64> {
        self.timer_updates.clone()
    }

    pub fn timer_tick_playing(&self) -> bool {
        self.tick_playing
    }

    pub fn play_timer_tick_count(&self) -> usize {
        self.tick_plays
    }

    pub fn play_timer_ended_count(&self) -> usize {
        self.ended_plays
    }

    pub fn stage_revealed(&self) -> bool {
        self.stage_revealed
    }

    pub fn waiting_fade_count(&self) -> usize {
        self.waiting_fades
    }
}

impl PlaybackSurface for RecordingSurface {
    fn play_one_shot(&mut self, handle: AudioHandle) {
        self.one_shots.push(handle);
        self.playing.insert(handle);
    }

    fn fade_in_audio(&mut self, handle: AudioHandle, _fade: Duration) {
        self.audio_fade_ins.push(handle);
        self.playing.insert(handle);
    }

    fn fade_out_audio(&mut self, handle: AudioHandle, _fade: Duration) {
        // Still audible until the ramp finishes; tests call finish_audio
        self.audio_fade_outs.push(handle);
    }

    fn cancel_audio_fade(&mut self, handle: AudioHandle) {
        self.audio_fade_cancels.push(handle);
    }

    fn stop_audio(&mut self, handle: AudioHandle) {
        self.playing.remove(&handle);
    }

    fn audio_playing(&self, handle: AudioHandle) -> bool {
        self.playing.contains(&handle)
    }

    fn assign_image(&mut self, slot: ImageSlot, handle: ImageHandle) {
        self.assigned.insert(slot_index(slot), handle);
    }

    fn fade_in_slot(&mut self, slot: ImageSlot, _fade: Duration) {
        self.slot_fade_ins[slot_index(slot)] += 1;
        self.slot_opacity[slot_index(slot)] = 1.0;
    }

    fn fade_out_slot(&mut self, slot: ImageSlot, _fade: Duration) {
        self.slot_fade_outs[slot_index(slot)] += 1;
        self.slot_opacity[slot_index(slot)] = 0.0;
    }

    fn cancel_slot_fades(&mut self) {
        self.slot_fade_cancels += 1;
    }

    fn set_slot_opacity(&mut self, slot: ImageSlot, opacity: f32) {
        self.slot_opacity[slot_index(slot)] = opacity;
    }

    fn slot_opacity(&self, slot: ImageSlot) -> f32 {
        self.slot_opacity[slot_index(slot)]
    }

    fn show_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }

    fn clear_text(&mut self) {
        self.text = None;
    }

    fn show_timer(&mut self, seconds: u64) {
        self.timer_visible = true;
        self.timer_last_shown = Some(seconds);
    }

    fn update_timer(&mut self, seconds: u64) {
        self.timer_updates.push(seconds);
    }

    fn hide_timer(&mut self) {
        self.timer_visible = false;
    }

    fn play_timer_tick(&mut self) {
        self.tick_playing = true;
        self.tick_plays += 1;
    }

    fn stop_timer_tick(&mut self) {
        self.tick_playing = false;
    }

    fn play_timer_ended(&mut self) {
        self.ended_plays += 1;
    }

    fn stop_timer_ended(&mut self) {}

    fn reveal_stage(&mut self) {
        self.stage_revealed = true;
    }

    fn fade_out_waiting(&mut self, _fade: Duration) {
        self.waiting_fades += 1;
    }
}
