//! Demo pipeline object rendering a tunable gradient.

use super::runner::FrameSource;
use crate::frame::FrameBuffer;
use crate::tuner::{AccessorField, VirtualField};
use crate::types::{FieldKind, FieldValue};
use parking_lot::Mutex;
use std::sync::Arc;

/// Gradient direction choices, in option order
pub const DIRECTIONS: [&str; 3] = ["horizontal", "vertical", "diagonal"];

/// A pipeline object with one field of every kind
#[derive(Debug, Clone, PartialEq)]
pub struct GradientPipeline {
    pub gain: f64,
    pub offset: i64,
    pub invert: bool,
    pub label: String,
    pub direction: usize,
    /// x, y, width, height as fractions of the frame
    pub roi: [f64; 4],
    /// Per-channel multipliers (channel 4 unused for RGB)
    pub tint: [f64; 4],
    /// Bright spot centre as fractions of the frame
    pub anchor: [f64; 2],
    /// Advanced by the pipeline every iteration
    pub frames_rendered: i64,
}

impl Default for GradientPipeline {
    fn default() -> Self {
        Self {
            gain: 1.0,
            offset: 0,
            invert: false,
            label: "gradient".to_string(),
            direction: 0,
            roi: [0.0, 0.0, 1.0, 1.0],
            tint: [1.0; 4],
            anchor: [0.5, 0.5],
            frames_rendered: 0,
        }
    }
}

impl GradientPipeline {
    fn base_level(&self, x: usize, y: usize, width: usize, height: usize, phase: f64) -> f64 {
        let fx = x as f64 / width.max(1) as f64;
        let fy = y as f64 / height.max(1) as f64;
        let t = match self.direction {
            0 => fx,
            1 => fy,
            _ => (fx + fy) / 2.0,
        };
        let dx = fx - self.anchor[0];
        let dy = fy - self.anchor[1];
        let spot = (1.0 - (dx * dx + dy * dy).sqrt() * 4.0).max(0.0);
        ((t + phase).fract() * 0.8 + spot * 0.2) * 255.0
    }

    fn in_roi(&self, x: usize, y: usize, width: usize, height: usize) -> bool {
        let fx = x as f64 / width.max(1) as f64;
        let fy = y as f64 / height.max(1) as f64;
        let [rx, ry, rw, rh] = self.roi;
        fx >= rx && fx < rx + rw && fy >= ry && fy < ry + rh
    }
}

impl FrameSource for GradientPipeline {
    fn process(&mut self, iteration: u64, frame: &mut FrameBuffer) {
        let (width, height, channels) = (frame.width(), frame.height(), frame.channels());
        let phase = (iteration % 120) as f64 / 120.0;

        for y in 0..height {
            for x in 0..width {
                let inside = self.in_roi(x, y, width, height);
                let level = self.base_level(x, y, width, height, phase);
                let Some(pixel) = frame.pixel_mut(x, y) else {
                    continue;
                };
                for (c, byte) in pixel.iter_mut().enumerate().take(channels) {
                    let mut v = if inside {
                        level * self.gain * self.tint[c.min(3)] + self.offset as f64
                    } else {
                        0.0
                    };
                    if self.invert {
                        v = 255.0 - v;
                    }
                    *byte = v.clamp(0.0, 255.0) as u8;
                }
            }
        }

        self.frames_rendered += 1;
    }
}

/// Expose every field of `target` for tuning
pub fn gradient_fields(target: &Arc<Mutex<GradientPipeline>>) -> Vec<Arc<dyn VirtualField>> {
    vec![
        AccessorField::new(
            "gain",
            FieldKind::Decimal,
            target,
            |p: &GradientPipeline| FieldValue::Decimal(p.gain),
            |p, v| {
                if let FieldValue::Decimal(g) = v {
                    p.gain = g;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "offset",
            FieldKind::Integer,
            target,
            |p: &GradientPipeline| FieldValue::Integer(p.offset),
            |p, v| {
                if let FieldValue::Integer(o) = v {
                    p.offset = o;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "invert",
            FieldKind::Boolean,
            target,
            |p: &GradientPipeline| FieldValue::Boolean(p.invert),
            |p, v| {
                if let FieldValue::Boolean(b) = v {
                    p.invert = b;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "label",
            FieldKind::Text,
            target,
            |p: &GradientPipeline| FieldValue::Text(p.label.clone()),
            |p, v| {
                if let FieldValue::Text(s) = v {
                    p.label = s;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "direction",
            FieldKind::Enumerated,
            target,
            |p: &GradientPipeline| FieldValue::Enumerated(p.direction),
            |p, v| {
                if let FieldValue::Enumerated(i) = v {
                    p.direction = i;
                }
            },
        )
        .with_options(DIRECTIONS)
        .shared(),
        AccessorField::new(
            "roi",
            FieldKind::Rect,
            target,
            |p: &GradientPipeline| FieldValue::Rect(p.roi),
            |p, v| {
                if let FieldValue::Rect(r) = v {
                    p.roi = r;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "tint",
            FieldKind::Scalar,
            target,
            |p: &GradientPipeline| FieldValue::Scalar(p.tint),
            |p, v| {
                if let FieldValue::Scalar(s) = v {
                    p.tint = s;
                }
            },
        )
        .shared(),
        AccessorField::new(
            "anchor",
            FieldKind::Point,
            target,
            |p: &GradientPipeline| FieldValue::Point(p.anchor),
            |p, v| {
                if let FieldValue::Point(a) = v {
                    p.anchor = a;
                }
            },
        )
        .shared(),
        // Read-only in practice: the pipeline overwrites it every iteration
        AccessorField::new(
            "frames_rendered",
            FieldKind::Integer,
            target,
            |p: &GradientPipeline| FieldValue::Integer(p.frames_rendered),
            |p, v| {
                if let FieldValue::Integer(n) = v {
                    p.frames_rendered = n;
                }
            },
        )
        .shared(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_cover_every_kind() {
        let target = Arc::new(Mutex::new(GradientPipeline::default()));
        let fields = gradient_fields(&target);
        let kinds: Vec<_> = fields.iter().map(|f| f.kind()).collect();

        for kind in [
            FieldKind::Integer,
            FieldKind::Decimal,
            FieldKind::Text,
            FieldKind::Boolean,
            FieldKind::Enumerated,
            FieldKind::Point,
            FieldKind::Scalar,
            FieldKind::Rect,
        ] {
            assert!(kinds.contains(&kind), "missing {}", kind);
        }
    }

    #[test]
    fn test_process_counts_iterations() {
        let mut pipeline = GradientPipeline::default();
        let mut frame = FrameBuffer::new(8, 8, 3);
        pipeline.process(0, &mut frame);
        pipeline.process(1, &mut frame);
        assert_eq!(pipeline.frames_rendered, 2);
    }

    #[test]
    fn test_empty_roi_blanks_frame() {
        let mut pipeline = GradientPipeline {
            roi: [0.0, 0.0, 0.0, 0.0],
            ..Default::default()
        };
        let mut frame = FrameBuffer::new(8, 8, 3);
        frame.fill(7);
        pipeline.process(0, &mut frame);
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invert_flips_levels() {
        let mut pipeline = GradientPipeline {
            roi: [0.0, 0.0, 0.0, 0.0],
            invert: true,
            ..Default::default()
        };
        let mut frame = FrameBuffer::new(4, 4, 1);
        pipeline.process(0, &mut frame);
        assert!(frame.as_bytes().iter().all(|&b| b == 255));
    }

    #[test]
    fn test_field_edit_reaches_target() {
        let target = Arc::new(Mutex::new(GradientPipeline::default()));
        let fields = gradient_fields(&target);
        let gain = fields.iter().find(|f| f.name() == "gain").unwrap();

        gain.set(FieldValue::Decimal(2.0)).unwrap();
        assert_eq!(target.lock().gain, 2.0);
    }
}
