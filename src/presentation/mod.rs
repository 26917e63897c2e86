/// Presentation layer
///
/// Everything the player actually sees and hears. The connection layer only
/// enqueues; this module owns the single-threaded state that turns drained
/// commands into playback instructions:
///
/// - `machine` dispatches drained queue entries and holds session-wide state
/// - `audio` tracks the current background track and outgoing crossfades
/// - `image` flips between the two display slots for image crossfades
/// - `timer` advances the countdown one wall-clock second at a time
/// - `surface` is the seam to the real audio/video backend
pub mod audio;
pub mod image;
pub mod machine;
pub mod surface;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_surface;

pub use machine::{FadeTimings, PresentationStateMachine};
pub use surface::{AssetCatalog, AudioAsset, AudioHandle, ImageAsset, ImageHandle, ImageSlot, MemoryCatalog, PlaybackSurface};
