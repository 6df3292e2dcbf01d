//! Glyph classifier inference using Candle.
//!
//! The trained character model is process-wide immutable state: loaded
//! lazily on first use, shared read-only across concurrent grading
//! requests, never reloaded per request.

mod device;
mod glyph;
mod weights;

pub use device::get_device;
pub use glyph::{label_to_char, GlyphCnn, NUM_CLASSES};
pub use weights::{load_safetensors, LazyModel};
