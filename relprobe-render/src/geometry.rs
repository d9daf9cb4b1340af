use relprobe_core::ResponseKey;
use tiny_skia::Rect;

/// Stimulus box size at scale 1.
pub const STIMULUS_SIZE: (f32, f32) = (600.0, 500.0);
const BUTTON_SIZE: (f32, f32) = (160.0, 44.0);
const WIDE_BUTTON_WIDTH: f32 = 200.0;
const GAP: f32 = 10.0;
const MARGIN: f32 = 20.0;
/// Height of stimulus plus four button rows at scale 1.
const CONTENT_HEIGHT: f32 =
    MARGIN + STIMULUS_SIZE.1 + 2.0 * GAP + 4.0 * BUTTON_SIZE.1 + 3.0 * GAP + MARGIN;
const CONTENT_WIDTH: f32 = STIMULUS_SIZE.0 + 2.0 * MARGIN;

/// Where the stimulus and each button sit for a given canvas size.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub scale: f32,
    pub stimulus: Rect,
    pub buttons: [(ResponseKey, Rect); 5],
}

impl Geometry {
    /// Lays out the stimulus on top and the button rows below it:
    /// up, left/right, down, no-connection. Shrinks to fit small canvases,
    /// never grows. `None` for a degenerate canvas.
    pub fn compute(width: u32, height: u32) -> Option<Self> {
        let (w, h) = (width as f32, height as f32);
        let scale = (w / CONTENT_WIDTH).min(h / CONTENT_HEIGHT).min(1.0);
        if scale <= 0.0 {
            return None;
        }
        let cx = w * 0.5;
        let top = ((h - CONTENT_HEIGHT * scale) * 0.5).max(0.0) + MARGIN * scale;

        let (sw, sh) = (STIMULUS_SIZE.0 * scale, STIMULUS_SIZE.1 * scale);
        let stimulus = Rect::from_xywh(cx - sw * 0.5, top, sw, sh)?;

        let (bw, bh) = (BUTTON_SIZE.0 * scale, BUTTON_SIZE.1 * scale);
        let gap = GAP * scale;
        let row_y = |row: usize| stimulus.bottom() + 2.0 * gap + row as f32 * (bh + gap);
        let wide = WIDE_BUTTON_WIDTH * scale;

        Some(Self {
            scale,
            stimulus,
            buttons: [
                (ResponseKey::ArrowUp, Rect::from_xywh(cx - bw * 0.5, row_y(0), bw, bh)?),
                (
                    ResponseKey::ArrowLeft,
                    Rect::from_xywh(cx - gap * 0.5 - bw, row_y(1), bw, bh)?,
                ),
                (ResponseKey::ArrowRight, Rect::from_xywh(cx + gap * 0.5, row_y(1), bw, bh)?),
                (ResponseKey::ArrowDown, Rect::from_xywh(cx - bw * 0.5, row_y(2), bw, bh)?),
                (ResponseKey::Space, Rect::from_xywh(cx - wide * 0.5, row_y(3), wide, bh)?),
            ],
        })
    }

    pub fn button(&self, key: ResponseKey) -> Option<Rect> {
        self.buttons.iter().find(|(k, _)| *k == key).map(|(_, r)| *r)
    }
}
