/// Background-track playback state
///
/// Invariant: at most one track is ever "current" (the target of new
/// fade-ins). A replaced track moves atomically from current into the
/// fading-out set; it is never both at once. The fading-out set holds at most
/// one entry per distinct track id, enforced by force-removing a duplicate id
/// before it is re-added.
use std::time::Duration;

use super::surface::{AudioHandle, PlaybackSurface};
use crate::protocol::AssetId;

/// A background track together with the surface handle its fades run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayingBgm {
    pub id: AssetId,
    pub handle: AudioHandle,
}

/// State of background-music playback (one-shot effects carry no state)
#[derive(Debug, Default)]
pub struct AudioPlaybackState {
    current: Option<PlayingBgm>,
    fading_out: Vec<PlayingBgm>,
}

impl AudioPlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the current background track, crossfading from the previous
    /// one. Re-triggering the track that is already current skips the
    /// re-fade but keeps it current (not a strict no-op like images).
    pub fn play_bgm(
        &mut self,
        id: AssetId,
        handle: AudioHandle,
        fade: Duration,
        surface: &mut dyn PlaybackSurface,
    ) {
        if self.current.map(|c| c.id) == Some(id) {
            return;
        }

        // The incoming track may still be mid-fade-out from an earlier
        // replacement; reclaim it before starting its fresh fade-in.
        if surface.audio_playing(handle) {
            self.clean_fade_outs(Some(id), surface);
        } else {
            self.clean_fade_outs(None, surface);
        }

        if let Some(previous) = self.current.take() {
            surface.cancel_audio_fade(previous.handle);
            surface.fade_out_audio(previous.handle, fade);
            self.fading_out.push(previous);
        }

        surface.fade_in_audio(handle, fade);
        self.current = Some(PlayingBgm { id, handle });
    }

    /// Fade out and drop the current track, if any
    pub fn stop_bgm(&mut self, fade: Duration, surface: &mut dyn PlaybackSurface) {
        self.clean_fade_outs(None, surface);

        if let Some(previous) = self.current.take() {
            surface.cancel_audio_fade(previous.handle);
            surface.fade_out_audio(previous.handle, fade);
            self.fading_out.push(previous);
        }
    }

    /// Sweep the fading-out set: drop entries whose playback has naturally
    /// finished, and force-remove (cancelling the ramp) an entry whose id is
    /// about to be reused so two transitions never touch the same track.
    pub fn clean_fade_outs(&mut self, forced_id: Option<AssetId>, surface: &mut dyn PlaybackSurface) {
        self.fading_out.retain(|entry| {
            if forced_id == Some(entry.id) {
                tracing::debug!("Force-removed fading track {}", entry.id);
                surface.cancel_audio_fade(entry.handle);
                false
            } else if !surface.audio_playing(entry.handle) {
                tracing::debug!("Removed finished fading track {}", entry.id);
                false
            } else {
                true
            }
        });
    }

    /// Hard-stop everything, fades included. Session teardown only; mid
    /// session transitions always go through the fade paths.
    pub fn halt(&mut self, surface: &mut dyn PlaybackSurface) {
        if let Some(current) = self.current.take() {
            surface.cancel_audio_fade(current.handle);
            surface.stop_audio(current.handle);
        }
        for entry in self.fading_out.drain(..) {
            surface.cancel_audio_fade(entry.handle);
            surface.stop_audio(entry.handle);
        }
    }

    /// Id of the current background track, if any
    pub fn current_id(&self) -> Option<AssetId> {
        self.current.map(|c| c.id)
    }

    pub fn fading_out_ids(&self) -> Vec<AssetId> {
        self.fading_out.iter().map(|e| e.id).collect()
    }

    /// Invariant check: current is exactly zero or one and never also in the
    /// fading-out set
    pub fn invariant_holds(&self) -> bool {
        match self.current {
            None => true,
            Some(current) => !self.fading_out.iter().any(|e| e.id == current.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::test_surface::RecordingSurface;

    const FADE: Duration = Duration::from_secs(3);

    #[test]
    fn test_first_bgm_becomes_current() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);

        assert_eq!(state.current_id(), Some(AssetId(5)));
        assert!(state.fading_out_ids().is_empty());
        assert_eq!(surface.fade_in_audio_count(AudioHandle(50)), 1);
    }

    #[test]
    fn test_same_id_retrigger_skips_refade() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);
        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);

        // No new fade-in; track 5 remains solely current
        assert_eq!(surface.fade_in_audio_count(AudioHandle(50)), 1);
        assert_eq!(state.current_id(), Some(AssetId(5)));
        assert!(state.fading_out_ids().is_empty());
    }

    #[test]
    fn test_replacement_moves_previous_to_fading_out_once() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);
        state.play_bgm(AssetId(9), AudioHandle(90), FADE, &mut surface);

        assert_eq!(state.current_id(), Some(AssetId(9)));
        assert_eq!(state.fading_out_ids(), vec![AssetId(5)]);
        assert_eq!(surface.fade_out_audio_count(AudioHandle(50)), 1);
        // The replaced track's fade-in ramp was cancelled
        assert_eq!(surface.cancel_audio_fade_count(AudioHandle(50)), 1);
        assert!(state.invariant_holds());
    }

    #[test]
    fn test_reusing_fading_id_force_removes_old_entry() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);
        state.play_bgm(AssetId(9), AudioHandle(90), FADE, &mut surface);
        // Track 5 is fading out and still audible when it is brought back
        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);

        // Never two entries for the same id
        assert_eq!(state.current_id(), Some(AssetId(5)));
        assert_eq!(state.fading_out_ids(), vec![AssetId(9)]);
        assert!(state.invariant_holds());
    }

    #[test]
    fn test_sweep_removes_finished_tracks() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);
        state.play_bgm(AssetId(9), AudioHandle(90), FADE, &mut surface);
        assert_eq!(state.fading_out_ids(), vec![AssetId(5)]);

        // Fade-out of track 5 finishes naturally
        surface.finish_audio(AudioHandle(50));
        state.clean_fade_outs(None, &mut surface);

        assert!(state.fading_out_ids().is_empty());
        assert_eq!(state.current_id(), Some(AssetId(9)));
    }

    #[test]
    fn test_stop_bgm_clears_current() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);
        state.stop_bgm(FADE, &mut surface);

        assert_eq!(state.current_id(), None);
        assert_eq!(state.fading_out_ids(), vec![AssetId(5)]);
        assert_eq!(surface.fade_out_audio_count(AudioHandle(50)), 1);

        // Stopping again is a no-op
        state.stop_bgm(FADE, &mut surface);
        assert_eq!(surface.fade_out_audio_count(AudioHandle(50)), 1);
    }

    #[test]
    fn test_halt_hard_stops_current_and_fading() {
        let mut state = AudioPlaybackState::new();
        let mut surface = RecordingSurface::new();

        state.play_bgm(AssetId(5), AudioHandle(50), FADE, &mut surface);
        state.play_bgm(AssetId(9), AudioHandle(90), FADE, &mut surface);
        state.halt(&mut surface);

        assert_eq!(state.current_id(), None);
        assert!(state.fading_out_ids().is_empty());
        // Both tracks stopped dead, no lingering ramps
        assert!(!surface.audio_playing(AudioHandle(50)));
        assert!(!surface.audio_playing(AudioHandle(90)));
    }
}
