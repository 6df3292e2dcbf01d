//! Versioned print-layout configuration.
//!
//! The PDF generator and the sheet parser must agree on where the QR code,
//! the student-ID box and the bubble panels sit on the page. Both sides
//! consume the same [`SheetLayout`] value so the geometry can never drift;
//! the `version` field ties a scanned sheet to the layout it was printed
//! with.

use serde::{Deserialize, Serialize};

/// Axis-aligned region in canonical (rectified) pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Grows the region by `buffer` on every side, clamped to `(max_w, max_h)`.
    #[must_use]
    pub fn padded(&self, buffer: u32, max_w: u32, max_h: u32) -> Self {
        let x = self.x.saturating_sub(buffer);
        let y = self.y.saturating_sub(buffer);
        let right = (self.x + self.width + buffer).min(max_w);
        let bottom = (self.y + self.height + buffer).min(max_h);
        Self {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }
}

/// One bubble-grid panel and the question range it carries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PanelRegion {
    /// Where the panel sits on the rectified page.
    pub region: Region,
    /// Number of questions printed in this panel.
    pub questions: usize,
}

/// Complete print layout for one sheet revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetLayout {
    /// Layout revision; bump when any geometry below changes.
    pub version: u32,
    /// Width of the rectified page in pixels.
    pub canonical_width: u32,
    /// Height of the rectified page in pixels.
    pub canonical_height: u32,
    /// Where the quiz QR code is printed.
    pub qr_region: Region,
    /// Where the student writes their identifier.
    pub id_box: Region,
    /// Bubble panels in left-to-right reading order.
    pub panels: Vec<PanelRegion>,
    /// Number of answer options per question.
    pub options_per_question: usize,
    /// Pixel buffer applied around every cropped region to absorb
    /// print/scan jitter.
    pub jitter_px: u32,
}

impl SheetLayout {
    /// Layout revision 1: A4 at 150 dpi (1240 x 1754 px), matching the
    /// original print constants (20 pt margin, 80 pt QR top-left, 200 x 20 pt
    /// ID box, one 10-question bubble panel).
    #[must_use]
    pub fn v1() -> Self {
        Self {
            version: 1,
            canonical_width: 1240,
            canonical_height: 1754,
            qr_region: Region {
                x: 42,
                y: 42,
                width: 167,
                height: 167,
            },
            id_box: Region {
                x: 250,
                y: 385,
                width: 417,
                height: 42,
            },
            panels: vec![PanelRegion {
                region: Region {
                    x: 42,
                    y: 521,
                    width: 823,
                    height: 1042,
                },
                questions: 10,
            }],
            options_per_question: 5,
            jitter_px: 8,
        }
    }

    /// Total questions across all panels.
    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.panels.iter().map(|p| p.questions).sum()
    }
}
