use crate::browser;
use anyhow::{anyhow, Context, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use futures::channel::oneshot::channel;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - we create the closure and specify the expected type ourselves
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

pub mod particles;
pub mod stage;
pub mod timeline;

/// TABLE
/// ┌──────────────────────── Frame Flow ─────────────────────────────┐
/// │                                                                 │
/// │  requestAnimationFrame(perf)                                    │
/// │   └─► GameLoop accumulates (perf - last_frame)                  │
/// │        ├─► while accumulated > FRAME_SIZE : game.update(step)   │
/// │        │     └─► Showcase ─► attached Scene ─► Timeline         │
/// │        └─► game.draw(renderer)                                  │
/// │              └─► Showcase ─► Fit transform ─► Scene::draw       │
/// │                                                                 │
/// └─────────────────────────────────────────────────────────────────┘
pub trait Game {
    /// advance simulation by `delta` milliseconds
    fn update(&mut self, delta: f64);
    fn draw(&mut self, renderer: &Renderer);
}

// length of a frame in milliseconds
pub const FRAME_SIZE: f64 = 1.0 / 60.0 * 1000.0;
// clamp after a backgrounded tab resumes
const MAX_CATCH_UP: f64 = 250.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f64,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub fn start<G: Game + 'static>(game: Rc<RefCell<G>>, renderer: Renderer) -> Result<()> {
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            game_loop.accumulated_delta =
                (game_loop.accumulated_delta + perf - game_loop.last_frame).min(MAX_CATCH_UP);
            {
                let mut game = game.borrow_mut();
                while game_loop.accumulated_delta > FRAME_SIZE {
                    game.update(FRAME_SIZE);
                    game_loop.accumulated_delta -= FRAME_SIZE;
                }
                game.draw(&renderer);
            }
            game_loop.last_frame = perf;
            if let Some(next) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next) {
                    error!("GameLoop: {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================
#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            position: Point { x, y },
            size: Size { width, height },
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + self.size.width
            && point.y >= self.position.y
            && point.y <= self.position.y + self.size.height
    }
}

/// 0xRRGGBB
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    pub fn channels(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        )
    }

    pub fn from_channels(r: u8, g: u8, b: u8) -> Self {
        Color(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub fn to_css(self) -> String {
        format!("#{:06x}", self.0 & 0xffffff)
    }
}

/// Where and how a textured or text node lands on the canvas
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub scale: f64,
    /// radians
    pub rotation: f64,
    /// 0.0 = top/left, 0.5 = centre
    pub anchor: Point,
}

impl Placement {
    /// unscaled, unrotated, anchored top left
    pub const fn at(position: Point) -> Self {
        Placement {
            position,
            scale: 1.0,
            rotation: 0.0,
            anchor: Point::new(0.0, 0.0),
        }
    }

    pub fn centered(mut self) -> Self {
        self.anchor = Point::new(0.5, 0.5);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub fill: Color,
    pub wrap_width: Option<f64>,
}

impl TextStyle {
    pub fn new(font_size: f64, fill: Color) -> Self {
        TextStyle {
            font_size,
            fill,
            wrap_width: None,
        }
    }

    pub fn wrapped(mut self, width: f64) -> Self {
        self.wrap_width = Some(width);
        self
    }

    fn font(&self) -> String {
        format!("{}px Arial", self.font_size)
    }
}

// ==================== Rendering ====================
/// Loaded images by logical name (bundle keys) or url (remote avatars)
pub type Textures = Rc<RefCell<HashMap<String, HtmlImageElement>>>;

pub struct Renderer {
    context: CanvasRenderingContext2d,
    textures: Textures,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d, textures: Textures) -> Self {
        Renderer { context, textures }
    }

    pub fn clear(&self, rect: &Rect) {
        self.fill_rect(rect, Color::BLACK);
    }

    pub fn fill_rect(&self, rect: &Rect, color: Color) {
        self.context.set_fill_style(&JsValue::from_str(&color.to_css()));
        self.context.fill_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    /// Run `draw` with the design canvas scaled by `scale` and moved to `offset`
    pub fn with_transform(&self, scale: f64, offset: Point, draw: impl FnOnce(&Renderer)) {
        self.context.save();
        // translate/scale only fail on a detached context, nothing to draw then
        if self.context.translate(offset.x, offset.y).is_ok() && self.context.scale(scale, scale).is_ok()
        {
            draw(self);
        }
        self.context.restore();
    }

    /// Draw a loaded texture, silently skipped while the image is missing
    /// or still decoding
    /// - returns whether anything was drawn
    pub fn draw_texture(&self, key: &str, placement: &Placement, alpha: f64) -> bool {
        let textures = self.textures.borrow();
        let Some(image) = textures.get(key) else {
            return false;
        };
        if !image.complete() || image.natural_width() == 0 {
            return false;
        }
        let (width, height) = (image.natural_width() as f64, image.natural_height() as f64);
        self.placed(placement, alpha, |context| {
            let _ = context.draw_image_with_html_image_element_and_dw_and_dh(
                image,
                -width * placement.anchor.x,
                -height * placement.anchor.y,
                width,
                height,
            );
        });
        true
    }

    /// Texture plus an additive colour wash approximating a tint
    /// - nothing at all while the texture is missing or decoding
    pub fn draw_tinted(&self, key: &str, placement: &Placement, alpha: f64, tint: Color) {
        if !self.draw_texture(key, placement, alpha) {
            return;
        }
        let radius = 8.0 * placement.scale;
        self.context.save();
        self.context.set_global_alpha(alpha * 0.5);
        let _ = self.context.set_global_composite_operation("lighter");
        self.context.set_fill_style(&JsValue::from_str(&tint.to_css()));
        self.context.begin_path();
        let _ = self.context.arc(
            placement.position.x,
            placement.position.y,
            radius,
            0.0,
            std::f64::consts::TAU,
        );
        self.context.fill();
        self.context.restore();
    }

    pub fn draw_text(&self, text: &str, placement: &Placement, style: &TextStyle, alpha: f64) {
        if text.is_empty() {
            return;
        }
        self.placed(placement, alpha, |context| {
            context.set_font(&style.font());
            context.set_fill_style(&JsValue::from_str(&style.fill.to_css()));
            context.set_text_baseline("top");
            let lines = match style.wrap_width {
                Some(width) => wrap_lines(text, |line| measure(context, line), width),
                None => vec![text.to_string()],
            };
            let line_height = style.font_size * 1.2;
            let block_height = line_height * lines.len() as f64;
            let top = -block_height * placement.anchor.y;
            for (index, line) in lines.iter().enumerate() {
                let left = -measure(context, line) * placement.anchor.x;
                let _ = context.fill_text(line, left, top + index as f64 * line_height);
            }
        });
    }

    /// Width of `text` set in `style`, zero without text metrics
    pub fn measure_text(&self, text: &str, style: &TextStyle) -> f64 {
        self.context.save();
        self.context.set_font(&style.font());
        let width = measure(&self.context, text);
        self.context.restore();
        width
    }

    fn placed(&self, placement: &Placement, alpha: f64, draw: impl FnOnce(&CanvasRenderingContext2d)) {
        let context = &self.context;
        context.save();
        context.set_global_alpha(alpha.clamp(0.0, 1.0));
        let moved = context
            .translate(placement.position.x, placement.position.y)
            .and_then(|_| context.rotate(placement.rotation))
            .and_then(|_| context.scale(placement.scale, placement.scale));
        if moved.is_ok() {
            draw(context);
        }
        context.restore();
    }
}

fn measure(context: &CanvasRenderingContext2d, text: &str) -> f64 {
    context
        .measure_text(text)
        .map(|metrics| metrics.width())
        .unwrap_or(0.0)
}

/// Greedy word wrap, a single word wider than `width` keeps its own line
pub fn wrap_lines(text: &str, measure: impl Fn(&str) -> f64, width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if measure(&candidate) > width && !current.is_empty() {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ==================== Assets ====================
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Asset {
    pub key: String,
    pub path: String,
}

/// A named group of assets loaded together with aggregate progress
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssetBundle {
    pub name: String,
    pub assets: Vec<Asset>,
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move |_: JsValue| {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!("Error loading image: {:#?}", err)));
        }
    });

    // each callback is released after its first call, the other one leaks
    image.set_onload(Some(success_callback.unchecked_ref()));
    image.set_onerror(Some(error_callback.unchecked_ref()));
    image.set_src(source);

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    rx.await??;

    Ok(image)
}

/// Load every asset of `bundle` in parallel into `textures`
/// - `on_progress` receives the completed fraction in 0.0..=1.0
/// - first failure aborts the bundle
pub async fn load_bundle(
    bundle: &AssetBundle,
    textures: &Textures,
    mut on_progress: impl FnMut(f64),
) -> Result<()> {
    let total = bundle.assets.len();
    if total == 0 {
        on_progress(1.0);
        return Ok(());
    }

    let mut loads: FuturesUnordered<_> = bundle
        .assets
        .iter()
        .map(|asset| async move { (asset, load_image(&asset.path).await) })
        .collect();

    let mut loaded = 0;
    while let Some((asset, result)) = loads.next().await {
        let image = result.with_context(|| {
            format!(
                "Failed to load '{}' of bundle '{}' from : {}",
                asset.key, bundle.name, asset.path
            )
        })?;
        textures.borrow_mut().insert(asset.key.clone(), image);
        loaded += 1;
        on_progress(loaded as f64 / total as f64);
    }
    Ok(())
}
