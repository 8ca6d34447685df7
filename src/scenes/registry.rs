use super::Scene;
use std::collections::HashMap;

/// Name -> scene mapping with a single attached slot
/// - attach/detach bookkeeping only, disposing is up to the shell
#[derive(Default)]
pub struct SceneRegistry {
    scenes: HashMap<String, Box<dyn Scene>>,
    attached: Option<String>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        SceneRegistry::default()
    }

    /// Store `scene` under `name`, handing back the scene it replaced
    pub fn register(&mut self, name: impl Into<String>, scene: Box<dyn Scene>) -> Option<Box<dyn Scene>> {
        self.scenes.insert(name.into(), scene)
    }

    /// Detach the attached scene and attach `name`
    /// - unregistered `name` leaves nothing attached and returns false
    pub fn activate(&mut self, name: &str) -> bool {
        self.detach();
        if self.scenes.contains_key(name) {
            self.attached = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Name of the scene that was attached
    pub fn detach(&mut self) -> Option<String> {
        self.attached.take()
    }

    /// Remove `name` entirely, detaching it first when attached
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Scene>> {
        if self.attached.as_deref() == Some(name) {
            self.attached = None;
        }
        self.scenes.remove(name)
    }

    pub fn attached_name(&self) -> Option<&str> {
        self.attached.as_deref()
    }

    pub fn attached(&self) -> Option<&dyn Scene> {
        let name = self.attached.as_ref()?;
        self.scenes.get(name).map(|scene| scene.as_ref())
    }

    pub fn attached_mut(&mut self) -> Option<&mut (dyn Scene + 'static)> {
        let name = self.attached.as_ref()?;
        self.scenes.get_mut(name).map(|scene| scene.as_mut())
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Renderer;
    use crate::scenes::SceneKind;

    struct Still(SceneKind);

    impl Scene for Still {
        fn kind(&self) -> SceneKind {
            self.0
        }
        fn update(&mut self, _delta: f64) {}
        fn draw(&self, _renderer: &Renderer) {}
        fn dispose(&mut self) {}
    }

    #[test]
    fn activate_switches_the_attached_scene() {
        let mut registry = SceneRegistry::new();
        registry.register("cards", Box::new(Still(SceneKind::AceOfShadows)));
        registry.register("flame", Box::new(Still(SceneKind::PhoenixFlame)));

        assert!(registry.attached().is_none());
        assert!(registry.activate("cards"));
        assert_eq!(registry.attached_name(), Some("cards"));
        assert!(registry.activate("flame"));

        assert_eq!(
            registry.attached().map(|scene| scene.kind()),
            Some(SceneKind::PhoenixFlame)
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_name_leaves_nothing_attached() {
        let mut registry = SceneRegistry::new();
        registry.register("cards", Box::new(Still(SceneKind::AceOfShadows)));
        registry.activate("cards");

        assert!(!registry.activate("nope"));

        assert!(registry.attached().is_none());
        assert!(registry.attached_mut().is_none());
    }

    #[test]
    fn register_overwrites_and_returns_previous() {
        let mut registry = SceneRegistry::new();
        assert!(registry
            .register("scene", Box::new(Still(SceneKind::AceOfShadows)))
            .is_none());

        let previous = registry.register("scene", Box::new(Still(SceneKind::MagicWords)));

        assert_eq!(previous.map(|scene| scene.kind()), Some(SceneKind::AceOfShadows));
        assert_eq!(registry.len(), 1);
        registry.activate("scene");
        assert_eq!(
            registry.attached().map(|scene| scene.kind()),
            Some(SceneKind::MagicWords)
        );
    }

    #[test]
    fn remove_detaches_attached_scene() {
        let mut registry = SceneRegistry::new();
        registry.register("cards", Box::new(Still(SceneKind::AceOfShadows)));
        registry.activate("cards");

        assert!(registry.remove("cards").is_some());

        assert_eq!(registry.attached_name(), None);
        assert!(registry.is_empty());
    }
}
