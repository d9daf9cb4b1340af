use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ab_glyph::{FontVec, InvalidFont};
use relprobe_core::{DisplaySurface, ResponseKey, ResponseLayout, StimulusRef, Verdict};
use thiserror::Error;
use tiny_skia::{
    Color, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};
use tracing::{debug, warn};

use crate::geometry::Geometry;
use crate::text::TextCache;

const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const BUTTON_FILL: [u8; 4] = [239, 239, 239, 255];
const BUTTON_BORDER: [u8; 4] = [118, 118, 118, 255];
const CORRECT_FILL: [u8; 4] = [144, 238, 144, 255];
const INCORRECT_FILL: [u8; 4] = [255, 0, 0, 255];
const PLACEHOLDER_FILL: [u8; 4] = [200, 200, 200, 255];
const LABEL_COLOR: [u8; 4] = [0, 0, 0, 255];
const NOTICE_COLOR: [u8; 4] = [255, 0, 0, 255];
const LABEL_SIZE_PX: f32 = 18.0;
const NOTICE_SIZE_PX: f32 = 24.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid font file {}: {source}", path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: InvalidFont,
    },

    #[error("failed to decode stimulus {stimulus}: {source}")]
    Image {
        stimulus: StimulusRef,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot allocate a {width}x{height} canvas")]
    Size { width: u32, height: u32 },
}

pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec, RenderError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(bytes).map_err(|source| RenderError::Font {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes an image file into a premultiplied pixmap.
pub fn load_stimulus(stimulus: &StimulusRef) -> Result<Pixmap, RenderError> {
    let image = image::open(stimulus.as_str())
        .map_err(|source| RenderError::Image {
            stimulus: stimulus.clone(),
            source,
        })?
        .into_rgba8();
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(RenderError::Size { width, height })?;

    let mut data = image.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size).ok_or(RenderError::Size { width, height })
}

#[derive(Debug, Clone, PartialEq)]
enum Scene {
    Blank,
    Stimulus(StimulusRef),
    Trial {
        layout: ResponseLayout,
        marked: Option<(ResponseKey, Verdict)>,
    },
    Notice(String),
}

/// CPU display surface: draws trials into a tiny-skia canvas that the host
/// copies into its frame buffer with [`SkiaSurface::present`].
pub struct SkiaSurface {
    width: u32,
    height: u32,
    canvas: Pixmap,
    geometry: Option<Geometry>,
    text: Option<TextCache>,
    images: HashMap<StimulusRef, Option<Arc<Pixmap>>>,
    pinned: HashSet<StimulusRef>,
    scene: Scene,
    dirty: bool,
}

impl SkiaSurface {
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let canvas = Pixmap::new(width, height).ok_or(RenderError::Size { width, height })?;
        let mut surface = Self {
            width,
            height,
            canvas,
            geometry: Geometry::compute(width, height),
            text: None,
            images: HashMap::new(),
            pinned: HashSet::new(),
            scene: Scene::Blank,
            dirty: true,
        };
        surface.redraw();
        Ok(surface)
    }

    /// Enables button labels and notices.
    pub fn with_font(mut self, font: FontVec) -> Self {
        self.text = Some(TextCache::new(font));
        self.redraw();
        self
    }

    /// Decodes the given stimuli now so showing them later costs only a blit.
    ///
    /// Prepared stimuli stay cached for the life of the surface; anything
    /// decoded on demand is dropped again when the surface is cleared.
    pub fn prepare_stimuli<'a, I>(&mut self, stimuli: I) -> usize
    where
        I: IntoIterator<Item = &'a StimulusRef>,
    {
        let mut decoded = 0;
        for stimulus in stimuli {
            if self.pinned.insert(stimulus.clone()) && self.stimulus_pixmap(stimulus).is_some() {
                decoded += 1;
            }
        }
        decoded
    }

    pub fn cached_stimuli(&self) -> usize {
        self.images.len()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn button_rect(&self, key: ResponseKey) -> Option<Rect> {
        self.geometry.as_ref()?.button(key)
    }

    pub fn stimulus_rect(&self) -> Option<Rect> {
        self.geometry.as_ref().map(|g| g.stimulus)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.canvas = Pixmap::new(width, height).ok_or(RenderError::Size { width, height })?;
        self.width = width;
        self.height = height;
        self.geometry = Geometry::compute(width, height);
        self.redraw();
        Ok(())
    }

    /// Copies the canvas into an RGBA frame if anything changed since the
    /// last call. The canvas is opaque, so premultiplied and straight alpha
    /// are the same bytes.
    pub fn present(&mut self, frame: &mut [u8]) -> bool {
        if !self.dirty {
            return false;
        }
        let data = self.canvas.data();
        if frame.len() != data.len() {
            warn!(
                frame = frame.len(),
                canvas = data.len(),
                "frame buffer size does not match canvas"
            );
            return false;
        }
        frame.copy_from_slice(data);
        self.dirty = false;
        true
    }

    fn set_scene(&mut self, scene: Scene) {
        self.scene = scene;
        self.redraw();
    }

    fn redraw(&mut self) {
        self.canvas.fill(color(BACKGROUND));
        self.dirty = true;
        let Some(geometry) = self.geometry.clone() else {
            return;
        };
        match self.scene.clone() {
            Scene::Blank => {}
            Scene::Stimulus(stimulus) => self.draw_stimulus(&stimulus, geometry.stimulus),
            Scene::Trial { layout, marked } => {
                self.draw_stimulus(&layout.stimulus, geometry.stimulus);
                for button in layout.buttons() {
                    let Some(rect) = geometry.button(button.key) else {
                        continue;
                    };
                    let verdict = marked.filter(|(k, _)| *k == button.key).map(|(_, v)| v);
                    self.draw_button(rect, &button.label, verdict, geometry.scale);
                }
            }
            Scene::Notice(text) => {
                let center = (self.width as f32 * 0.5, self.height as f32 * 0.5);
                self.draw_text(&text, NOTICE_SIZE_PX, NOTICE_COLOR, center, false);
            }
        }
    }

    fn stimulus_pixmap(&mut self, stimulus: &StimulusRef) -> Option<Arc<Pixmap>> {
        self.images
            .entry(stimulus.clone())
            .or_insert_with(|| match load_stimulus(stimulus) {
                Ok(pm) => {
                    debug!(%stimulus, width = pm.width(), height = pm.height(), "stimulus loaded");
                    Some(Arc::new(pm))
                }
                Err(e) => {
                    warn!(error = %e, "drawing placeholder for stimulus");
                    None
                }
            })
            .clone()
    }

    fn draw_stimulus(&mut self, stimulus: &StimulusRef, rect: Rect) {
        match self.stimulus_pixmap(stimulus) {
            Some(pm) => {
                let transform = Transform::from_row(
                    rect.width() / pm.width() as f32,
                    0.0,
                    0.0,
                    rect.height() / pm.height() as f32,
                    rect.x(),
                    rect.y(),
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                self.canvas
                    .draw_pixmap(0, 0, Pixmap::as_ref(&pm), &paint, transform, None);
            }
            None => self.fill_rect(rect, PLACEHOLDER_FILL),
        }
    }

    fn draw_button(&mut self, rect: Rect, label: &str, verdict: Option<Verdict>, scale: f32) {
        let fill = match verdict {
            Some(Verdict::Correct) => CORRECT_FILL,
            Some(Verdict::Incorrect) => INCORRECT_FILL,
            None => BUTTON_FILL,
        };
        self.fill_rect(rect, fill);

        let bold = verdict.is_some();
        let stroke = Stroke {
            width: if bold { 3.0 } else { 1.5 } * scale.max(0.5),
            ..Stroke::default()
        };
        let mut paint = Paint::default();
        paint.set_color(color(BUTTON_BORDER));
        paint.anti_alias = true;
        let path = PathBuilder::from_rect(rect);
        self.canvas
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);

        let center = (rect.x() + rect.width() * 0.5, rect.y() + rect.height() * 0.5);
        self.draw_text(label, LABEL_SIZE_PX * scale, LABEL_COLOR, center, bold);
    }

    fn draw_text(&mut self, text: &str, size_px: f32, rgba: [u8; 4], center: (f32, f32), bold: bool) {
        let Some(cache) = self.text.as_mut() else {
            return;
        };
        let Some(pm) = cache.get_or_render(text, size_px, rgba) else {
            return;
        };
        let x = (center.0 - pm.width() as f32 * 0.5).round() as i32;
        let y = (center.1 - pm.height() as f32 * 0.5).round() as i32;
        let paint = PixmapPaint::default();
        self.canvas
            .draw_pixmap(x, y, Pixmap::as_ref(&pm), &paint, Transform::identity(), None);
        if bold {
            self.canvas
                .draw_pixmap(x + 1, y, Pixmap::as_ref(&pm), &paint, Transform::identity(), None);
        }
    }

    fn fill_rect(&mut self, rect: Rect, rgba: [u8; 4]) {
        let mut paint = Paint::default();
        paint.set_color(color(rgba));
        paint.anti_alias = false;
        self.canvas
            .fill_rect(rect, &paint, Transform::identity(), None);
    }
}

fn color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}

impl DisplaySurface for SkiaSurface {
    fn show_stimulus(&mut self, stimulus: &StimulusRef) {
        self.set_scene(Scene::Stimulus(stimulus.clone()));
    }

    fn show_trial(&mut self, layout: &ResponseLayout) {
        self.set_scene(Scene::Trial {
            layout: layout.clone(),
            marked: None,
        });
    }

    fn mark_response(&mut self, key: ResponseKey, verdict: Verdict) {
        if let Scene::Trial { marked, .. } = &mut self.scene {
            *marked = Some((key, verdict));
            self.redraw();
        }
    }

    fn show_notice(&mut self, text: &str) {
        self.set_scene(Scene::Notice(text.to_string()));
    }

    fn clear(&mut self) {
        let pinned = &self.pinned;
        self.images.retain(|stimulus, _| pinned.contains(stimulus));
        self.set_scene(Scene::Blank);
    }
}
