//! Bubble mark detection with per-sheet threshold calibration.
//!
//! Contours are filtered to bubble-shaped candidates by bounding-box size
//! and aspect ratio, assigned to their question row and option column by
//! position against the panel's print pitch, and measured by the amount of
//! ink inside each contour mask. Absolute ink counts are unstable
//! across lighting conditions, so the "marked" cutoff is calibrated per
//! sheet: half the highest observed count, floored at a fixed minimum so a
//! uniformly faint scan cannot mark everything.

use anyhow::Result;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_polygon_mut;
use imageproc::morphology::close;
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::debug;

use crate::domain::MarkedAnswers;

/// Tuning for bubble candidate filtering and fill measurement.
#[derive(Debug, Clone, Copy)]
pub struct BubbleConfig {
    /// Minimum bubble bounding-box side, in pixels.
    pub min_size: u32,
    /// Maximum bubble bounding-box side, in pixels.
    pub max_size: u32,
    /// Minimum width/height ratio of a bubble box.
    pub min_aspect: f32,
    /// Maximum width/height ratio of a bubble box.
    pub max_aspect: f32,
    /// Absolute floor for the calibrated mark threshold, in ink pixels.
    pub fill_floor: u32,
    /// Structuring-element radius for the morphological-closing retry.
    pub close_radius: u8,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            min_size: 20,
            max_size: 90,
            min_aspect: 0.75,
            max_aspect: 1.35,
            fill_floor: 200,
            close_radius: 2,
        }
    }
}

/// A bubble candidate: its traced outline and bounding box.
struct Bubble {
    points: Vec<Point<i32>>,
    rect: Rect,
}

/// Detects which options were marked in one bubble panel.
pub struct FillDetector {
    config: BubbleConfig,
}

impl FillDetector {
    /// Creates a detector with the given tuning.
    #[must_use]
    pub const fn new(config: BubbleConfig) -> Self {
        Self { config }
    }

    /// Runs detection over one panel.
    ///
    /// `options` is the number of answer options per question; `questions`
    /// is how many questions the panel is printed with. Question indices in
    /// the returned map are panel-local (0-based); the pipeline offsets
    /// them per panel.
    ///
    /// # Errors
    ///
    /// Returns an error only on unusable pixel data; too few detected
    /// bubbles degrade to blank answers instead of failing.
    pub fn detect(
        &self,
        panel: &GrayImage,
        options: usize,
        questions: usize,
    ) -> Result<MarkedAnswers> {
        if options == 0 || questions == 0 || panel.width() < 4 || panel.height() < 4 {
            anyhow::bail!(
                "unusable bubble panel: {}x{} with {options} options",
                panel.width(),
                panel.height()
            );
        }

        let level = otsu_level(panel);
        let thresh = threshold(panel, level, ThresholdType::BinaryInverted);

        let expected = options * questions;
        let bubbles = self.bubble_candidates(&thresh, expected);
        debug!(
            found = bubbles.len(),
            expected, "bubble candidates after filtering"
        );

        // Each candidate is assigned the grid cell its center falls in, so
        // an outline lost to blur or noise leaves one empty cell instead of
        // shifting every later candidate onto the wrong option.
        let mut counts = vec![vec![0u32; options]; questions];
        for bubble in &bubbles {
            let Some((question, option)) =
                grid_cell(&bubble.rect, panel.width(), panel.height(), options, questions)
            else {
                continue;
            };
            let ink = ink_inside(&thresh, bubble);
            counts[question][option] = counts[question][option].max(ink);
        }

        // Per-sheet calibration over every candidate on the panel.
        let max_count = counts.iter().flatten().copied().max().unwrap_or(0);
        let mark_threshold = (max_count / 2).max(self.config.fill_floor);
        debug!(max_count, mark_threshold, "calibrated fill threshold");

        let mut marked = MarkedAnswers::new();
        for (question, cell_counts) in counts.iter().enumerate() {
            let options_marked: Vec<usize> = cell_counts
                .iter()
                .enumerate()
                .filter(|(_, &count)| count > mark_threshold)
                .map(|(option, _)| option)
                .collect();
            if !options_marked.is_empty() {
                marked.insert(question, options_marked);
            }
        }
        Ok(marked)
    }

    /// Extracts bubble-shaped contours, retrying with a morphological
    /// closing pass when the direct pass does not yield the expected count.
    fn bubble_candidates(&self, thresh: &GrayImage, expected: usize) -> Vec<Bubble> {
        let direct = self.filter_contours(thresh);
        if direct.len() == expected {
            return direct;
        }

        // Broken outlines (faint print, sensor noise) merge under closing.
        let closed = close(thresh, Norm::LInf, self.config.close_radius);
        let merged = self.filter_contours(&closed);
        debug!(
            direct = direct.len(),
            merged = merged.len(),
            expected,
            "bubble contour fallback pass"
        );
        if merged.len() == expected || merged.len() > direct.len() {
            merged
        } else {
            direct
        }
    }

    fn filter_contours(&self, thresh: &GrayImage) -> Vec<Bubble> {
        let contours: Vec<Contour<i32>> = find_contours(thresh);
        contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.points.len() >= 3)
            .filter_map(|c| {
                let rect = bounding_rect(&c.points)?;
                Some(Bubble {
                    points: c.points,
                    rect,
                })
            })
            .filter(|b| self.is_bubble_shaped(&b.rect))
            .collect()
    }

    fn is_bubble_shaped(&self, rect: &Rect) -> bool {
        let (w, h) = (rect.width(), rect.height());
        #[allow(clippy::cast_precision_loss)]
        let aspect = w as f32 / h as f32;
        w >= self.config.min_size
            && w <= self.config.max_size
            && h >= self.config.min_size
            && h <= self.config.max_size
            && aspect >= self.config.min_aspect
            && aspect <= self.config.max_aspect
    }
}

/// Maps a candidate's center to its question row and option column, with
/// the panel divided into a uniform `questions` x `options` grid. Centers
/// outside the panel map to `None`.
fn grid_cell(
    rect: &Rect,
    panel_width: u32,
    panel_height: u32,
    options: usize,
    questions: usize,
) -> Option<(usize, usize)> {
    #[allow(clippy::cast_possible_wrap)]
    let cx = rect.left() + rect.width() as i32 / 2;
    #[allow(clippy::cast_possible_wrap)]
    let cy = rect.top() + rect.height() as i32 / 2;
    let cx = usize::try_from(cx).ok()?;
    let cy = usize::try_from(cy).ok()?;
    let question = cy * questions / panel_height as usize;
    let option = cx * options / panel_width as usize;
    (question < questions && option < options).then_some((question, option))
}

/// Counts thresholded ink pixels inside the bubble's outline mask.
fn ink_inside(thresh: &GrayImage, bubble: &Bubble) -> u32 {
    let mut mask = GrayImage::new(thresh.width(), thresh.height());
    draw_polygon_mut(&mut mask, &bubble.points, Luma([255u8]));

    let left = bubble.rect.left().max(0) as u32;
    let top = bubble.rect.top().max(0) as u32;
    let right = (left + bubble.rect.width()).min(thresh.width());
    let bottom = (top + bubble.rect.height()).min(thresh.height());

    let mut count = 0u32;
    for y in top..bottom {
        for x in left..right {
            if mask.get_pixel(x, y).0[0] > 0 && thresh.get_pixel(x, y).0[0] > 0 {
                count += 1;
            }
        }
    }
    count
}

fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    let width = u32::try_from(max_x - min_x + 1).ok()?;
    let height = u32::try_from(max_y - min_y + 1).ok()?;
    Some(Rect::at(min_x, min_y).of_size(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

    const RADIUS: i32 = 22;
    const PITCH: i32 = 80;

    /// Renders a panel: `marks[q]` lists the filled option columns of row
    /// `q`. `skip` suppresses printing those (row, column) outlines
    /// entirely, mimicking an outline lost to blur or faint print.
    fn panel_with_gaps(
        questions: usize,
        options: usize,
        marks: &[Vec<usize>],
        skip: &[(usize, usize)],
    ) -> GrayImage {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mut panel = GrayImage::from_pixel(
            (options as i32 * PITCH) as u32,
            (questions as i32 * PITCH) as u32,
            Luma([245u8]),
        );
        for q in 0..questions {
            for o in 0..options {
                if skip.contains(&(q, o)) {
                    continue;
                }
                #[allow(clippy::cast_possible_wrap)]
                let center = (
                    o as i32 * PITCH + PITCH / 2,
                    q as i32 * PITCH + PITCH / 2,
                );
                if marks.get(q).is_some_and(|m| m.contains(&o)) {
                    draw_filled_circle_mut(&mut panel, center, RADIUS, Luma([20u8]));
                } else {
                    draw_hollow_circle_mut(&mut panel, center, RADIUS, Luma([20u8]));
                }
            }
        }
        panel
    }

    fn synthetic_panel(questions: usize, options: usize, marks: &[Vec<usize>]) -> GrayImage {
        panel_with_gaps(questions, options, marks, &[])
    }

    #[test]
    fn test_detects_single_marks_per_question() {
        let marks = vec![vec![0], vec![4], vec![2]];
        let panel = synthetic_panel(3, 5, &marks);
        let detector = FillDetector::new(BubbleConfig::default());
        let answers = detector.detect(&panel, 5, 3).expect("detection runs");
        assert_eq!(answers.get(&0), Some(&vec![0]));
        assert_eq!(answers.get(&1), Some(&vec![4]));
        assert_eq!(answers.get(&2), Some(&vec![2]));
    }

    #[test]
    fn test_preserves_multiple_marks() {
        let marks = vec![vec![1, 3]];
        let panel = synthetic_panel(1, 5, &marks);
        let detector = FillDetector::new(BubbleConfig::default());
        let answers = detector.detect(&panel, 5, 1).expect("detection runs");
        assert_eq!(answers.get(&0), Some(&vec![1, 3]));
    }

    #[test]
    fn test_blank_question_yields_no_entry() {
        let marks = vec![vec![2], vec![]];
        let panel = synthetic_panel(2, 5, &marks);
        let detector = FillDetector::new(BubbleConfig::default());
        let answers = detector.detect(&panel, 5, 2).expect("detection runs");
        assert_eq!(answers.get(&0), Some(&vec![2]));
        assert_eq!(answers.get(&1), None);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let marks = vec![vec![0], vec![3], vec![1, 2]];
        let panel = synthetic_panel(3, 5, &marks);
        let detector = FillDetector::new(BubbleConfig::default());
        let first = detector.detect(&panel, 5, 3).expect("first run");
        let second = detector.detect(&panel, 5, 3).expect("second run");
        assert_eq!(first, second);
    }

    #[test]
    fn test_calibration_invariant_under_brightness_scaling() {
        let marks = vec![vec![2], vec![4]];
        let bright = synthetic_panel(2, 5, &marks);
        // Same layout, uniformly darker: every pixel scaled to 60%.
        let dim = GrayImage::from_fn(bright.width(), bright.height(), |x, y| {
            let v = bright.get_pixel(x, y).0[0];
            Luma([(u16::from(v) * 6 / 10) as u8])
        });

        let detector = FillDetector::new(BubbleConfig::default());
        let from_bright = detector.detect(&bright, 5, 2).expect("bright run");
        let from_dim = detector.detect(&dim, 5, 2).expect("dim run");
        assert_eq!(from_bright, from_dim);
    }

    #[test]
    fn test_all_blank_sheet_marks_nothing() {
        // With no filled bubble the calibrated threshold bottoms out at the
        // floor, which hollow outlines must not exceed.
        let marks = vec![vec![], vec![]];
        let panel = synthetic_panel(2, 5, &marks);
        let detector = FillDetector::new(BubbleConfig::default());
        let answers = detector.detect(&panel, 5, 2).expect("detection runs");
        assert!(answers.is_empty());
    }

    #[test]
    fn test_missing_outline_does_not_shift_later_marks() {
        // An undetected blank outline early in the panel must not pull the
        // marks that follow it onto neighboring options.
        let marks = vec![vec![], vec![2], vec![4]];
        let panel = panel_with_gaps(3, 5, &marks, &[(0, 1), (0, 3)]);
        let detector = FillDetector::new(BubbleConfig::default());
        let answers = detector.detect(&panel, 5, 3).expect("detection runs");
        assert_eq!(answers.get(&0), None);
        assert_eq!(answers.get(&1), Some(&vec![2]));
        assert_eq!(answers.get(&2), Some(&vec![4]));
    }

    #[test]
    fn test_rejects_unusable_panel() {
        let panel = GrayImage::new(2, 2);
        let detector = FillDetector::new(BubbleConfig::default());
        assert!(detector.detect(&panel, 5, 1).is_err());
        let panel = GrayImage::new(100, 100);
        assert!(detector.detect(&panel, 0, 1).is_err());
    }
}
