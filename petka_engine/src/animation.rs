//! Decoded animation model consumed by hit-testing, z ordering and frame
//! stepping. Decoding itself belongs to the resource layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle: `left <= x < right`, `top <= y < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let rect = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        if rect.is_empty() {
            Rect::default()
        } else {
            rect
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum Pixels {
    /// 8-bit palette indices. A pixel is transparent when its palette colour
    /// equals the colour of entry 0.
    Indexed {
        palette: Vec<[u8; 3]>,
        data: Vec<u8>,
    },
    /// RGB565 pixels compared against an explicit transparent colour.
    Rgb565 { transparent: u16, data: Vec<u16> },
}

/// One decoded frame placed at `offset` inside the animation bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub offset: Point,
    pub width: u32,
    pub height: u32,
    pub pixels: Pixels,
}

impl Frame {
    /// `x`/`y` are relative to the frame's top-left pixel.
    pub fn is_opaque_at(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        let index = y as usize * self.width as usize + x as usize;
        match &self.pixels {
            Pixels::Indexed { palette, data } => {
                let Some(&entry) = data.get(index) else {
                    return false;
                };
                match (palette.first(), palette.get(entry as usize)) {
                    (Some(key), Some(colour)) => key != colour,
                    _ => false,
                }
            }
            Pixels::Rgb565 { transparent, data } => data
                .get(index)
                .map(|pixel| pixel != transparent)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub bounds: Rect,
    pub frames: Vec<Frame>,
    #[serde(default = "default_delay")]
    pub delay_ms: u32,
    #[serde(default)]
    pub mask_rects: Vec<Rect>,
    #[serde(skip)]
    current: usize,
}

fn default_delay() -> u32 {
    100
}

impl Animation {
    pub fn new(bounds: Rect, frames: Vec<Frame>, delay_ms: u32) -> Self {
        Self {
            bounds,
            frames,
            delay_ms,
            mask_rects: Vec::new(),
            current: 0,
        }
    }

    pub fn with_mask_rects(mut self, mask_rects: Vec<Rect>) -> Self {
        self.mask_rects = mask_rects;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current)
    }

    pub fn rewind(&mut self) {
        self.current = 0;
    }

    /// Steps to the next frame, wrapping after the last one.
    pub fn advance(&mut self) {
        if self.frames.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.frames.len();
    }

    /// Per-pixel test for a point given relative to the object position.
    pub fn hit(&self, x: i32, y: i32) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        let Some(frame) = self.current_frame() else {
            return false;
        };
        frame.is_opaque_at(x - frame.offset.x, y - frame.offset.y)
    }

    pub fn mask_bottom(&self) -> Option<i32> {
        self.mask_rects.iter().map(|rect| rect.bottom).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x2 indexed frame: left half uses the key colour, right half is opaque.
    fn half_opaque_animation() -> Animation {
        let frame = Frame {
            offset: Point::new(0, 0),
            width: 4,
            height: 2,
            pixels: Pixels::Indexed {
                palette: vec![[0, 0, 0], [255, 0, 0], [0, 0, 0]],
                data: vec![0, 2, 1, 1, 0, 2, 1, 1],
            },
        };
        Animation::new(Rect::sized(4, 2), vec![frame], 100)
    }

    #[test]
    fn point_outside_bounds_never_hits() {
        let animation = half_opaque_animation();
        assert!(!animation.hit(-1, 0));
        assert!(!animation.hit(4, 0));
        assert!(!animation.hit(2, 2));
    }

    #[test]
    fn palette_entries_sharing_the_key_colour_are_transparent() {
        let animation = half_opaque_animation();
        assert!(!animation.hit(0, 0));
        assert!(!animation.hit(1, 1));
        assert!(animation.hit(2, 0));
        assert!(animation.hit(3, 1));
    }

    #[test]
    fn rgb565_frames_use_the_transparent_colour() {
        let frame = Frame {
            offset: Point::new(1, 0),
            width: 2,
            height: 1,
            pixels: Pixels::Rgb565 {
                transparent: 0xF81F,
                data: vec![0xF81F, 0x07E0],
            },
        };
        let animation = Animation::new(Rect::sized(3, 1), vec![frame], 100);
        assert!(!animation.hit(0, 0), "inside bounds but outside the frame");
        assert!(!animation.hit(1, 0));
        assert!(animation.hit(2, 0));
    }

    #[test]
    fn advance_wraps_after_last_frame() {
        let mut animation = half_opaque_animation();
        animation.frames.push(animation.frames[0].clone());
        animation.advance();
        assert_eq!(animation.current_frame_index(), 1);
        animation.advance();
        assert_eq!(animation.current_frame_index(), 0);
    }

    #[test]
    fn intersection_of_disjoint_rects_is_empty() {
        let a = Rect::sized(10, 10);
        assert!(a.intersection(&Rect::new(20, 20, 30, 30)).is_empty());
        assert_eq!(a.intersection(&Rect::new(5, 5, 30, 30)), Rect::new(5, 5, 10, 10));
    }
}
