//! Vector overlay drawn on top of output frames.
//!
//! The anonymizer only emits [`DrawCommand`]s; [`Rasterizer`] is one consumer
//! that burns them into an `RgbImage`.

mod render;

pub use render::Rasterizer;

use crate::pose::{Pose, EDGES};
use std::collections::HashMap;

pub const STATUS_FONT_SIZE: f32 = 16.0;
pub const KEYPOINT_RADIUS: i32 = 5;
pub const EDGE_WIDTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
    Cyan,
    Blue,
}

impl Color {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Black => [0, 0, 0],
            Color::White => [255, 255, 255],
            Color::Cyan => [0, 255, 255],
            Color::Blue => [0, 0, 255],
        }
    }
}

/// One drawing primitive, in frame pixel coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// `origin` is the left end of the text baseline
    Text {
        origin: (i32, i32),
        text: String,
        fill: Color,
        font_size: f32,
    },
    Circle {
        center: (i32, i32),
        radius: i32,
        fill: Color,
        stroke: Color,
    },
    Line {
        start: (i32, i32),
        end: (i32, i32),
        stroke: Color,
        width: u32,
    },
}

/// Text with a one pixel black drop shadow so it reads on any background
pub fn shadow_text(commands: &mut Vec<DrawCommand>, x: i32, y: i32, text: &str) {
    commands.push(DrawCommand::Text {
        origin: (x + 1, y + 1),
        text: text.to_string(),
        fill: Color::Black,
        font_size: STATUS_FONT_SIZE,
    });
    commands.push(DrawCommand::Text {
        origin: (x, y),
        text: text.to_string(),
        fill: Color::White,
        font_size: STATUS_FONT_SIZE,
    });
}

/// Keypoint circles plus skeleton edges whose ends both clear `threshold`
///
/// Low-confidence keypoints are skipped along with every edge touching them.
pub fn draw_pose(commands: &mut Vec<DrawCommand>, pose: &Pose, color: Color, threshold: f32) {
    let mut points = HashMap::new();
    for keypoint in &pose.keypoints {
        if keypoint.score < threshold {
            continue;
        }
        let center = (keypoint.x as i32, keypoint.y as i32);
        points.insert(keypoint.label, center);
        commands.push(DrawCommand::Circle {
            center,
            radius: KEYPOINT_RADIUS,
            fill: Color::Cyan,
            stroke: color,
        });
    }

    for (a, b) in EDGES.iter() {
        if let (Some(&start), Some(&end)) = (points.get(a), points.get(b)) {
            commands.push(DrawCommand::Line {
                start,
                end,
                stroke: color,
                width: EDGE_WIDTH,
            });
        }
    }
}
