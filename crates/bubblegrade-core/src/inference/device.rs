//! Compute device selection for glyph classification.

use candle_core::Device;
use tracing::info;

/// Picks the compute device the glyph classifier runs on.
///
/// Prefers Metal or CUDA when the matching cargo feature is enabled and
/// the device initializes; a single 28x28 glyph batch otherwise runs on
/// the CPU.
#[must_use]
pub fn get_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Classifying glyphs on Metal");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Classifying glyphs on CUDA");
            return device;
        }
    }

    info!("Classifying glyphs on the CPU");
    Device::Cpu
}
