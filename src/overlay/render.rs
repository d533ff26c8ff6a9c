use super::{Color, DrawCommand};
use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut,
};
use std::path::Path;

/// Burns overlay commands into a frame
///
/// Text needs a font; without one, text commands are skipped and only the
/// skeleton is drawn.
#[derive(Default)]
pub struct Rasterizer {
    font: Option<FontVec>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF font for status text
    pub fn with_font<P: AsRef<Path>>(font_path: P) -> Result<Self> {
        let path = font_path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| anyhow::anyhow!("Invalid font {}: {}", path.display(), e))?;
        tracing::info!("Loaded overlay font from {}", path.display());
        Ok(Self { font: Some(font) })
    }

    pub fn draw(&self, frame: &mut RgbImage, commands: &[DrawCommand]) {
        let _span = tracing::debug_span!("rasterize").entered();

        for command in commands {
            match command {
                DrawCommand::Text {
                    origin,
                    text,
                    fill,
                    font_size,
                } => {
                    if let Some(font) = &self.font {
                        // imageproc anchors text at its top edge
                        let top = origin.1 - *font_size as i32;
                        draw_text_mut(
                            frame,
                            pixel(*fill),
                            origin.0,
                            top,
                            PxScale::from(*font_size),
                            font,
                            text,
                        );
                    }
                }
                DrawCommand::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => {
                    draw_filled_circle_mut(frame, *center, *radius, pixel(*fill));
                    draw_hollow_circle_mut(frame, *center, *radius, pixel(*stroke));
                }
                DrawCommand::Line {
                    start,
                    end,
                    stroke,
                    width,
                } => {
                    // Thick lines as parallel one pixel segments
                    let vertical = (end.1 - start.1).abs() > (end.0 - start.0).abs();
                    for i in 0..*width as i32 {
                        let (dx, dy) = if vertical { (i, 0) } else { (0, i) };
                        draw_line_segment_mut(
                            frame,
                            ((start.0 + dx) as f32, (start.1 + dy) as f32),
                            ((end.0 + dx) as f32, (end.1 + dy) as f32),
                            pixel(*stroke),
                        );
                    }
                }
            }
        }
    }
}

fn pixel(color: Color) -> Rgb<u8> {
    Rgb(color.rgb())
}
