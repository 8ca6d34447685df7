// TABLE:
// ┌──────────────────────────────────────────────────────────────────────┐
// │                         Scene Overview                               │
// ├──────────────────┬──────────────────┬────────────────────────────────┤
// │ Scene            │ File             │ Driven by                      │
// ├──────────────────┼──────────────────┼────────────────────────────────┤
// │ Ace of Shadows   │ cards.rs         │ deal interval + move tweens    │
// │ Magic Words      │ dialogue.rs      │ remote document + type timer   │
// │ Phoenix Flame    │ flame.rs         │ particle emitter per frame     │
// ├──────────────────┼──────────────────┼────────────────────────────────┤
// │ (bookkeeping)    │ registry.rs      │ name -> scene, attached slot   │
// └──────────────────┴──────────────────┴────────────────────────────────┘
pub mod cards;
pub mod dialogue;
pub mod flame;
pub mod registry;

use crate::engine::Renderer;

/// One mutually exclusive presentation
/// - constructed ready to run
/// - `update` once per fixed frame step while attached
/// - `dispose` exactly once before the shell detaches it
pub trait Scene {
    fn kind(&self) -> SceneKind;
    /// advance by `delta` milliseconds
    fn update(&mut self, delta: f64);
    /// draw in design canvas coordinates
    fn draw(&self, renderer: &Renderer);
    /// cancel every timer, tween and pending load, after this the scene
    /// no longer changes
    fn dispose(&mut self);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SceneKind {
    AceOfShadows,
    MagicWords,
    PhoenixFlame,
}

impl SceneKind {
    pub const ALL: [SceneKind; 3] = [
        SceneKind::AceOfShadows,
        SceneKind::MagicWords,
        SceneKind::PhoenixFlame,
    ];

    /// registry key
    pub fn name(self) -> &'static str {
        match self {
            SceneKind::AceOfShadows => "AceOfShadows",
            SceneKind::MagicWords => "MagicWords",
            SceneKind::PhoenixFlame => "PhoenixFlame",
        }
    }

    /// button caption
    pub fn label(self) -> &'static str {
        match self {
            SceneKind::AceOfShadows => "Ace of Shadows",
            SceneKind::MagicWords => "Magic Words",
            SceneKind::PhoenixFlame => "Phoenix Flame",
        }
    }
}
