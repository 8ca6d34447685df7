use crate::browser;
use crate::config::{ShowcaseConfig, CONFIG_PATH};
use crate::engine::{self, GameLoop, Point, Renderer, Size, Textures};
use crate::scenes::cards::CardScene;
use crate::scenes::dialogue::DialogueScene;
use crate::scenes::flame::FlameScene;
use crate::scenes::{Scene, SceneKind};
use crate::shell::{SceneFactory, Showcase};
use crate::source::{self, RemoteDialogue};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use web_sys::{Event, PointerEvent};

/// Scenes wired to the page : entropy seeded randomness and a live
/// dialogue endpoint
struct BrowserScenes {
    config: ShowcaseConfig,
    textures: Textures,
}

impl SceneFactory for BrowserScenes {
    fn create(&mut self, kind: SceneKind) -> Box<dyn Scene> {
        match kind {
            SceneKind::AceOfShadows => Box::new(CardScene::new(
                self.config.cards.clone(),
                StdRng::from_entropy(),
            )),
            SceneKind::MagicWords => {
                let source = RemoteDialogue::new(self.config.dialogue.endpoint.clone());
                let document = source::spawn_load(source, self.textures.clone());
                Box::new(DialogueScene::new(self.config.dialogue.clone(), document))
            }
            SceneKind::PhoenixFlame => Box::new(FlameScene::new(StdRng::from_entropy())),
        }
    }
}

type SharedShowcase = Rc<RefCell<Showcase<BrowserScenes>>>;

async fn load_config() -> ShowcaseConfig {
    match browser::fetch_json::<ShowcaseConfig>(CONFIG_PATH).await {
        Ok(config) => config,
        Err(err) => {
            log!("Using default configuration, {} : {:#}", CONFIG_PATH, err);
            ShowcaseConfig::default()
        }
    }
}

fn viewport() -> Result<Size> {
    let (width, height) = browser::viewport_size()?;
    Ok(Size { width, height })
}

fn pointer(event: &PointerEvent) -> Point {
    Point::new(event.offset_x() as f64, event.offset_y() as f64)
}

fn listen_for_input(showcase: &SharedShowcase) -> Result<()> {
    let canvas = browser::canvas()?;

    let on_resize = showcase.clone();
    let resized = canvas.clone();
    let window = browser::window()?;
    browser::listen(&window, "resize", move |_: Event| {
        let size = match viewport() {
            Ok(size) => size,
            Err(err) => {
                error!("Resize : {:#}", err);
                return;
            }
        };
        if let Err(err) = browser::resize_canvas(&resized, size.width, size.height) {
            error!("Resize : {:#}", err);
        }
        on_resize.borrow_mut().resize(size);
    })?;

    let on_move = showcase.clone();
    browser::listen(&canvas, "pointermove", move |event: PointerEvent| {
        on_move.borrow_mut().pointer_moved(pointer(&event));
    })?;

    let on_down = showcase.clone();
    browser::listen(&canvas, "pointerdown", move |event: PointerEvent| {
        on_down.borrow_mut().pointer_down(pointer(&event));
    })?;

    Ok(())
}

/// Canvas setup, input, game loop, then the asset bundle
pub async fn run() -> Result<()> {
    let config = load_config().await;

    let canvas = browser::canvas()?;
    let size = viewport()?;
    browser::resize_canvas(&canvas, size.width, size.height)?;

    let textures: Textures = Rc::new(RefCell::new(HashMap::new()));
    let renderer = Renderer::new(browser::context()?, textures.clone());
    let bundle = config.bundle.clone();
    let factory = BrowserScenes {
        config: config.clone(),
        textures: textures.clone(),
    };
    let showcase: SharedShowcase = Rc::new(RefCell::new(Showcase::new(config, factory, size)));

    listen_for_input(&showcase)?;
    GameLoop::start(showcase.clone(), renderer)?;

    let progress = showcase.clone();
    let loaded = engine::load_bundle(&bundle, &textures, move |fraction| {
        progress.borrow_mut().on_progress(fraction)
    })
    .await;
    match loaded {
        Ok(()) => showcase.borrow_mut().on_loaded(),
        Err(err) => showcase.borrow_mut().on_load_failed(&err),
    }
    Ok(())
}
