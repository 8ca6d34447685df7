use super::{Placement, Point, Renderer, TextStyle};

/// Index of a node inside its owning [`Stage`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Numeric node properties that tweens can drive
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Property {
    X,
    Y,
    Alpha,
    Scale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Sprite { texture: String },
    Text { content: String, style: TextStyle },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Point,
    pub scale: f64,
    pub alpha: f64,
    pub rotation: f64,
    pub anchor: Point,
}

impl Node {
    pub fn sprite(texture: impl Into<String>) -> Self {
        Node::with_kind(NodeKind::Sprite {
            texture: texture.into(),
        })
    }

    pub fn text(content: impl Into<String>, style: TextStyle) -> Self {
        Node::with_kind(NodeKind::Text {
            content: content.into(),
            style,
        })
    }

    fn with_kind(kind: NodeKind) -> Self {
        Node {
            kind,
            position: Point::default(),
            scale: 1.0,
            alpha: 1.0,
            rotation: 0.0,
            anchor: Point::default(),
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn centered(mut self) -> Self {
        self.anchor = Point::new(0.5, 0.5);
        self
    }

    pub fn transparent(mut self) -> Self {
        self.alpha = 0.0;
        self
    }

    pub fn property(&self, property: Property) -> f64 {
        match property {
            Property::X => self.position.x,
            Property::Y => self.position.y,
            Property::Alpha => self.alpha,
            Property::Scale => self.scale,
        }
    }

    pub fn set_property(&mut self, property: Property, value: f64) {
        match property {
            Property::X => self.position.x = value,
            Property::Y => self.position.y = value,
            Property::Alpha => self.alpha = value,
            Property::Scale => self.scale = value,
        }
    }

    /// Text content, `None` for sprites
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { content, .. } => Some(content),
            NodeKind::Sprite { .. } => None,
        }
    }

    /// Mutable text content, `None` for sprites
    pub fn content_mut(&mut self) -> Option<&mut String> {
        match &mut self.kind {
            NodeKind::Text { content, .. } => Some(content),
            NodeKind::Sprite { .. } => None,
        }
    }

    fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            scale: self.scale,
            rotation: self.rotation,
            anchor: self.anchor,
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if self.alpha <= 0.0 {
            return;
        }
        match &self.kind {
            NodeKind::Sprite { texture } => {
                renderer.draw_texture(texture, &self.placement(), self.alpha);
            }
            NodeKind::Text { content, style } => {
                renderer.draw_text(content, &self.placement(), style, self.alpha)
            }
        }
    }
}

/// Flat retained scene graph owned by a single scene
/// - nodes live as long as the stage
/// - `order` is back-to-front draw order
#[derive(Debug, Default)]
pub struct Stage {
    nodes: Vec<Node>,
    order: Vec<NodeId>,
}

impl Stage {
    pub fn new() -> Self {
        Stage::default()
    }

    /// Add `node` on top of the draw order
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.order.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Raise `id` so it is drawn after every other node
    pub fn bring_to_front(&mut self, id: NodeId) {
        if let Some(index) = self.order.iter().position(|other| *other == id) {
            let id = self.order.remove(index);
            self.order.push(id);
        }
    }

    pub fn draw_order(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn draw(&self, renderer: &Renderer) {
        for id in &self.order {
            self.nodes[id.0].draw(renderer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Color;

    #[test]
    fn bring_to_front_moves_node_last_in_draw_order() {
        let mut stage = Stage::new();
        let a = stage.add(Node::sprite("a"));
        let b = stage.add(Node::sprite("b"));
        let c = stage.add(Node::sprite("c"));

        stage.bring_to_front(a);

        assert_eq!(stage.draw_order(), &[b, c, a]);
        assert_eq!(stage.len(), 3);
    }

    #[test]
    fn properties_map_to_node_fields() {
        let mut node = Node::sprite("card").at(Point::new(1.0, 2.0)).centered();
        node.set_property(Property::X, 10.0);
        node.set_property(Property::Alpha, 0.25);
        node.set_property(Property::Scale, 1.5);

        assert_eq!(node.position, Point::new(10.0, 2.0));
        assert_eq!(node.property(Property::Y), 2.0);
        assert_eq!(node.property(Property::Alpha), 0.25);
        assert_eq!(node.property(Property::Scale), 1.5);
        assert_eq!(node.anchor, Point::new(0.5, 0.5));
    }

    #[test]
    fn text_content_is_editable_and_sprites_have_none() {
        let mut stage = Stage::new();
        let text = stage.add(Node::text("", TextStyle::new(20.0, Color::WHITE)));
        let sprite = stage.add(Node::sprite("avatar").transparent());

        if let Some(content) = stage.get_mut(text).and_then(Node::content_mut) {
            content.push('H');
            content.push('i');
        }

        assert_eq!(stage.get(text).and_then(Node::content), Some("Hi"));
        assert_eq!(stage.get(sprite).and_then(Node::content), None);
        assert_eq!(stage.get(sprite).map(|node| node.alpha), Some(0.0));
    }
}
