/// Image slot state
///
/// Two slots crossfade against each other: the new image loads into the
/// hidden slot and fades in while the previously active slot fades out.
/// Showing the image that is already shown is a strict no-op.
use std::time::Duration;

use super::surface::{ImageHandle, ImageSlot, PlaybackSurface};
use crate::protocol::AssetId;

#[derive(Debug)]
pub struct ImagePresentationState {
    active: ImageSlot,
    shown: Option<AssetId>,
}

impl Default for ImagePresentationState {
    fn default() -> Self {
        Self {
            active: ImageSlot::A,
            shown: None,
        }
    }
}

impl ImagePresentationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crossfade to a new image. Returns false when `id` is already shown
    /// (no-op).
    pub fn show(
        &mut self,
        id: AssetId,
        handle: ImageHandle,
        fade_in: Duration,
        fade_out: Duration,
        surface: &mut dyn PlaybackSurface,
    ) -> bool {
        if self.shown == Some(id) {
            return false;
        }
        self.shown = Some(id);

        let previous = self.active;
        let target = previous.other();

        surface.cancel_slot_fades();
        if surface.slot_opacity(previous) > 0.0 {
            surface.fade_out_slot(previous, fade_out);
        }
        surface.assign_image(target, handle);
        surface.fade_in_slot(target, fade_in);

        self.active = target;
        true
    }

    /// Clear the screen: cancel pending fades, fade out the visible slot if
    /// it has nonzero opacity, snap the other slot to zero.
    pub fn clear(&mut self, fade_out: Duration, surface: &mut dyn PlaybackSurface) {
        surface.cancel_slot_fades();
        self.shown = None;

        let hidden = self.active.other();
        if surface.slot_opacity(hidden) > 0.0 {
            surface.set_slot_opacity(hidden, 0.0);
        }
        if surface.slot_opacity(self.active) > 0.0 {
            surface.fade_out_slot(self.active, fade_out);
        }
    }

    pub fn shown_id(&self) -> Option<AssetId> {
        self.shown
    }

    pub fn active_slot(&self) -> ImageSlot {
        self.active
    }
}
