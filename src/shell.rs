use crate::browser;
use crate::config::{FitPolicy, ShowcaseConfig};
use crate::engine::{Color, Game, Placement, Point, Rect, Renderer, Size, TextStyle};
use crate::scenes::registry::SceneRegistry;
use crate::scenes::{Scene, SceneKind};

/// TABLE
/// ┌──────────────────────── Shell Phases ───────────────────────────────┐
/// │  Phase     │ Enter by          │ Draws                              │
/// ├────────────┼───────────────────┼────────────────────────────────────┤
/// │  Loading   │ Showcase::new     │ "Loading..." + progress bar        │
/// │  Failed    │ on_load_failed    │ failure message                    │
/// │  Ready     │ on_loaded         │ attached scene, buttons, FPS       │
/// └────────────┴───────────────────┴────────────────────────────────────┘
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading { progress: Progress },
    Failed(String),
    Ready,
}

/// Loaded fraction of the asset bundle, always within 0.0..=1.0
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Progress(f64);

impl Progress {
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction.is_nan() {
            Progress(0.0)
        } else {
            Progress(fraction.clamp(0.0, 1.0))
        }
    }

    pub fn from_percent(percent: f64) -> Self {
        Progress::from_fraction(percent / 100.0)
    }

    pub fn fraction(self) -> f64 {
        self.0
    }
}

/// Uniform scale and offset mapping the design canvas into the viewport
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub offset: Point,
}

impl Fit {
    pub fn compute(policy: FitPolicy, viewport: Size, design: Size) -> Fit {
        let (width, height) = (viewport.width, viewport.height);
        match policy {
            FitPolicy::Contain => {
                let scale = (width / design.width).min(height / design.height).min(1.0);
                Fit {
                    scale,
                    offset: Point::new(
                        (width - design.width * scale) / 2.0,
                        (height - design.height * scale) / 2.0,
                    ),
                }
            }
            FitPolicy::Cover => {
                if width / height > design.width / design.height {
                    let scale = height / design.height;
                    Fit {
                        scale,
                        offset: Point::new((width - design.width * scale) / 2.0, 0.0),
                    }
                } else {
                    let scale = width / design.width;
                    Fit {
                        scale,
                        offset: Point::new(0.0, (height - design.height * scale) / 2.0),
                    }
                }
            }
        }
    }
}

/// Builds a fresh scene for every switch
pub trait SceneFactory {
    fn create(&mut self, kind: SceneKind) -> Box<dyn Scene>;
}

// ==================== Overlay ====================
const BUTTON_FONT: f64 = 24.0;
const BUTTON_PADDING: f64 = 10.0;
const HOVER: Color = Color(0xff0000);

const FPS_POSITION: Point = Point::new(10.0, 10.0);
const FPS_FONT: f64 = 16.0;
const FPS_COLOR: Color = Color(0x00ff00);

const BAR_WIDTH: f64 = 300.0;
const BAR_HEIGHT: f64 = 20.0;
const BAR_PADDING: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
struct Button {
    kind: SceneKind,
    bounds: Rect,
    hovered: bool,
}

impl Button {
    fn new(kind: SceneKind, index: usize) -> Self {
        // glyph count estimate until the first draw measures the label
        let width = kind.label().chars().count() as f64 * BUTTON_FONT * 0.55;
        Button {
            kind,
            bounds: Rect::new(
                20.0,
                80.0 + index as f64 * 60.0,
                width + BUTTON_PADDING * 2.0,
                BUTTON_FONT * 1.2 + BUTTON_PADDING * 2.0,
            ),
            hovered: false,
        }
    }

    fn style(&self) -> TextStyle {
        let fill = if self.hovered { HOVER } else { Color::WHITE };
        TextStyle::new(BUTTON_FONT, fill)
    }

    /// Hit box follows the measured label width
    fn fit_label(&mut self, width: f64) {
        if width > 0.0 {
            self.bounds.size.width = width + BUTTON_PADDING * 2.0;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let position = Point::new(
            self.bounds.position.x + BUTTON_PADDING,
            self.bounds.position.y + BUTTON_PADDING,
        );
        renderer.draw_text(
            self.kind.label(),
            &Placement::at(position),
            &self.style(),
            1.0,
        );
    }
}

/// Frames drawn per second of wall clock time
#[derive(Debug, Default)]
struct FpsCounter {
    frames: u32,
    // start of the current one second window
    since: Option<f64>,
    shown: u32,
}

impl FpsCounter {
    /// `now` in milliseconds, performance.now() in the browser
    fn frame(&mut self, now: f64) {
        self.frames += 1;
        match self.since {
            None => self.since = Some(now),
            Some(since) if now - since >= 1000.0 => {
                self.shown = self.frames;
                self.frames = 0;
                self.since = Some(now);
            }
            Some(_) => {}
        }
    }

    fn label(&self) -> String {
        format!("FPS: {}", self.shown)
    }
}

// ==================== Showcase ====================
/// Loading screen, scene buttons and the one attached scene
pub struct Showcase<F: SceneFactory> {
    config: ShowcaseConfig,
    factory: F,
    registry: SceneRegistry,
    phase: Phase,
    viewport: Size,
    fit: Option<Fit>,
    buttons: Vec<Button>,
    fps: FpsCounter,
}

impl<F: SceneFactory> Showcase<F> {
    pub fn new(config: ShowcaseConfig, factory: F, viewport: Size) -> Self {
        let buttons = SceneKind::ALL
            .iter()
            .enumerate()
            .map(|(index, kind)| Button::new(*kind, index))
            .collect();
        Showcase {
            config,
            factory,
            registry: SceneRegistry::new(),
            phase: Phase::Loading {
                progress: Progress::default(),
            },
            viewport,
            fit: None,
            buttons,
            fps: FpsCounter::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn fit(&self) -> Option<Fit> {
        self.fit
    }

    pub fn active_scene(&self) -> Option<SceneKind> {
        self.registry.attached().map(|scene| scene.kind())
    }

    /// `fraction` of the bundle loaded, ignored once loading is over
    pub fn on_progress(&mut self, fraction: f64) {
        if let Phase::Loading { progress } = &mut self.phase {
            *progress = Progress::from_fraction(fraction);
        }
    }

    pub fn on_loaded(&mut self) {
        log!("Bundle '{}' loaded", self.config.bundle.name);
        self.phase = Phase::Ready;
        self.refit();
    }

    pub fn on_load_failed(&mut self, err: &anyhow::Error) {
        error!("Failed to load assets : {:#}", err);
        self.phase = Phase::Failed(format!("{:#}", err));
    }

    /// Dispose the attached scene, then build and attach `kind`
    /// - ignored until every asset is loaded
    pub fn switch_scene(&mut self, kind: SceneKind) -> bool {
        if self.phase != Phase::Ready {
            log!("Ignoring switch to {}, assets not loaded", kind.label());
            return false;
        }

        if let Some(scene) = self.registry.attached_mut() {
            scene.dispose();
        }
        if let Some(name) = self.registry.detach() {
            self.registry.remove(&name);
        }

        let scene = self.factory.create(kind);
        self.registry.register(kind.name(), scene);
        self.registry.activate(kind.name());
        self.refit();
        log!("Switched to {}", kind.label());
        true
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.refit();
    }

    fn refit(&mut self) {
        self.fit = self
            .registry
            .attached()
            .map(|_| Fit::compute(self.config.fit, self.viewport, self.config.design));
    }

    /// Hover state follows the pointer, only while ready
    pub fn pointer_moved(&mut self, point: Point) {
        let ready = self.phase == Phase::Ready;
        for button in &mut self.buttons {
            button.hovered = ready && button.bounds.contains(point);
        }
    }

    /// Switch to the scene of the button under `point`, if any
    pub fn pointer_down(&mut self, point: Point) -> bool {
        let hit = self
            .buttons
            .iter()
            .find(|button| button.bounds.contains(point))
            .map(|button| button.kind);
        match hit {
            Some(kind) => self.switch_scene(kind),
            None => false,
        }
    }

    fn draw_loading(&self, renderer: &Renderer, progress: Progress) {
        let centre = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        renderer.draw_text(
            "Loading...",
            &Placement::at(Point::new(centre.x, centre.y - 50.0)).centered(),
            &TextStyle::new(32.0, Color::WHITE),
            1.0,
        );
        renderer.fill_rect(
            &Rect::new(
                centre.x - BAR_WIDTH / 2.0 - BAR_PADDING,
                centre.y - BAR_HEIGHT / 2.0,
                BAR_WIDTH + BAR_PADDING * 2.0,
                BAR_HEIGHT + BAR_PADDING * 2.0,
            ),
            Color(0x444444),
        );
        renderer.fill_rect(
            &Rect::new(
                centre.x - BAR_WIDTH / 2.0,
                centre.y - BAR_HEIGHT / 2.0 + BAR_PADDING,
                BAR_WIDTH * progress.fraction(),
                BAR_HEIGHT,
            ),
            Color(0x00ff00),
        );
    }

    fn draw_failure(&self, renderer: &Renderer, reason: &str) {
        let centre = Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        renderer.draw_text(
            &format!("Loading failed: {}", reason),
            &Placement::at(centre).centered(),
            &TextStyle::new(24.0, Color(0xff5555)).wrapped(self.viewport.width * 0.8),
            1.0,
        );
    }
}

impl<F: SceneFactory> Game for Showcase<F> {
    fn update(&mut self, delta: f64) {
        if let Some(scene) = self.registry.attached_mut() {
            scene.update(delta);
        }
    }

    fn draw(&mut self, renderer: &Renderer) {
        if let Ok(now) = browser::now() {
            self.fps.frame(now);
        }
        renderer.clear(&Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height));

        match &self.phase {
            Phase::Loading { progress } => self.draw_loading(renderer, *progress),
            Phase::Failed(reason) => self.draw_failure(renderer, reason),
            Phase::Ready => {
                if let (Some(scene), Some(fit)) = (self.registry.attached(), self.fit) {
                    renderer.with_transform(fit.scale, fit.offset, |renderer| scene.draw(renderer));
                }
                for button in &mut self.buttons {
                    let width = renderer.measure_text(button.kind.label(), &button.style());
                    button.fit_label(width);
                    button.draw(renderer);
                }
                renderer.draw_text(
                    &self.fps.label(),
                    &Placement::at(FPS_POSITION),
                    &TextStyle::new(FPS_FONT, FPS_COLOR),
                    1.0,
                );
            }
        }
    }
}
