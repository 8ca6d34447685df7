use super::{Scene, SceneKind};
use crate::config::CardStackConfig;
use crate::engine::stage::{Node, NodeId, Stage};
use crate::engine::timeline::{Handle, Timeline, TweenSpec};
use crate::engine::{Point, Renderer};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::VecDeque;

/// ELI5:
/// ┌──────────────── Card Flow ───────────────────────────────┐
/// │  From       →  Trigger              →  To                │
/// ├──────────────────────────────────────────────────────────┤
/// │  remaining  →  deal tick (pop last) →  in_flight         │
/// │  in_flight  →  move tween complete  →  moved (front)     │
/// │  moved      →  reset (all landed)   →  remaining         │
/// └──────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, PartialEq)]
enum CardEvent {
    Deal,
    Landed(NodeId),
    Reset,
}

/// Ace of Shadows : a stack of cards dealt one by one to the right
pub struct CardScene {
    config: CardStackConfig,
    stage: Stage,
    timeline: Timeline<CardEvent>,
    // construction order
    cards: Vec<NodeId>,
    // top of the stack is the last element
    remaining: Vec<NodeId>,
    in_flight: Vec<NodeId>,
    // most recently landed first
    moved: VecDeque<NodeId>,
    deal_timer: Option<Handle>,
    reset_timer: Option<Handle>,
    rng: StdRng,
}

impl CardScene {
    pub fn new(config: CardStackConfig, rng: StdRng) -> Self {
        let mut stage = Stage::new();
        let cards: Vec<NodeId> = (0..config.count)
            .map(|index| {
                let texture = if index % 2 == 0 {
                    &config.textures.0
                } else {
                    &config.textures.1
                };
                stage.add(
                    Node::sprite(texture.as_str())
                        .at(Self::stack_position(&config, index))
                        .centered(),
                )
            })
            .collect();

        let mut timeline = Timeline::new();
        let deal_timer = Some(timeline.every(config.deal_interval, CardEvent::Deal));

        CardScene {
            remaining: cards.clone(),
            cards,
            in_flight: Vec::new(),
            moved: VecDeque::new(),
            config,
            stage,
            timeline,
            deal_timer,
            reset_timer: None,
            rng,
        }
    }

    fn stack_position(config: &CardStackConfig, index: usize) -> Point {
        Point::new(config.base.x, config.base.y + index as f64 * config.spacing)
    }

    fn on_event(&mut self, event: CardEvent) {
        match event {
            CardEvent::Deal => self.deal(),
            CardEvent::Landed(card) => self.land(card),
            CardEvent::Reset => self.reset(),
        }
    }

    fn deal(&mut self) {
        let Some(card) = self.remaining.pop() else {
            return;
        };
        self.stage.bring_to_front(card);

        let (low, high) = self.config.x_spread;
        let spread = if high > low {
            self.rng.gen_range(low..high)
        } else {
            low
        };
        let jitter = if self.config.y_jitter > 0.0 {
            self.rng
                .gen_range(-self.config.y_jitter..=self.config.y_jitter)
        } else {
            0.0
        };

        self.in_flight.push(card);
        self.timeline.tween(
            &self.stage,
            TweenSpec::to(card)
                .x(self.config.min_x + spread)
                .y(self.config.base.y + jitter)
                .duration(self.config.move_duration)
                .on_complete(CardEvent::Landed(card)),
        );
    }

    fn land(&mut self, card: NodeId) {
        self.in_flight.retain(|other| *other != card);
        self.moved.push_front(card);

        let all_landed = self.remaining.is_empty() && self.in_flight.is_empty();
        if all_landed && self.reset_timer.is_none() {
            self.reset_timer = Some(self.timeline.after(self.config.reset_delay, CardEvent::Reset));
        }
    }

    fn reset(&mut self) {
        self.reset_timer = None;
        let moved = std::mem::take(&mut self.moved);
        for card in moved.into_iter().rev() {
            let position = Self::stack_position(&self.config, self.remaining.len());
            if let Some(node) = self.stage.get_mut(card) {
                node.position = position;
            }
            self.remaining.push(card);
        }
    }
}

impl Scene for CardScene {
    fn kind(&self) -> SceneKind {
        SceneKind::AceOfShadows
    }

    fn update(&mut self, delta: f64) {
        let until = self.timeline.now() + delta;
        while let Some(event) = self.timeline.next_event(until, &mut self.stage) {
            self.on_event(event);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        self.stage.draw(renderer);
    }

    fn dispose(&mut self) {
        if let Some(handle) = self.deal_timer.take() {
            self.timeline.cancel(handle);
        }
        if let Some(handle) = self.reset_timer.take() {
            self.timeline.cancel(handle);
        }
        for card in &self.cards {
            self.timeline.kill_tweens_of(*card);
        }
        log!("Stopped all card movements and cancelled card tweens.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stage::NodeKind;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn scene(seed: u64) -> CardScene {
        CardScene::new(CardStackConfig::default(), StdRng::seed_from_u64(seed))
    }

    fn position(scene: &CardScene, card: NodeId) -> Point {
        scene
            .stage
            .get(card)
            .map(|node| node.position)
            .expect("card node exists")
    }

    fn assert_partition(scene: &CardScene) {
        let all: HashSet<NodeId> = scene
            .remaining
            .iter()
            .chain(scene.in_flight.iter())
            .chain(scene.moved.iter())
            .copied()
            .collect();
        let total = scene.remaining.len() + scene.in_flight.len() + scene.moved.len();
        assert_eq!(total, 144);
        assert_eq!(all.len(), 144);
    }

    #[test]
    fn builds_alternating_stack() {
        let scene = scene(1);

        assert_eq!(scene.remaining.len(), 144);
        assert_eq!(scene.stage.len(), 144);
        for (index, card) in scene.cards.iter().enumerate() {
            let node = scene.stage.get(*card).expect("card node exists");
            let expected = if index % 2 == 0 {
                "card-back-black"
            } else {
                "card-back-red"
            };
            assert_eq!(
                node.kind,
                NodeKind::Sprite {
                    texture: expected.to_string()
                }
            );
            assert_relative_eq!(node.position.x, 630.0);
            assert_relative_eq!(node.position.y, 384.0 + index as f64 * 1.5);
        }
    }

    #[test]
    fn deals_top_card_each_second_and_raises_it() {
        let mut scene = scene(2);
        let top = *scene.remaining.last().expect("stack is full");
        let bottom_first = scene.stage.draw_order()[0];

        scene.update(999.0);
        assert!(scene.in_flight.is_empty());

        scene.update(1.0);
        assert_eq!(scene.in_flight, vec![top]);
        assert_eq!(scene.remaining.len(), 143);
        assert_eq!(scene.stage.draw_order().last(), Some(&top));
        assert_eq!(scene.stage.draw_order()[0], bottom_first);
    }

    #[test]
    fn dealt_cards_land_right_of_threshold() {
        let mut scene = scene(3);
        for _ in 0..400 {
            scene.update(100.0);
        }

        assert!(scene.moved.len() > 30);
        for card in &scene.moved {
            let landed = position(&scene, *card);
            assert!(landed.x > 1100.0, "x = {}", landed.x);
            assert!((364.0..=404.0).contains(&landed.y), "y = {}", landed.y);
        }
    }

    #[test]
    fn landing_happens_after_move_duration() {
        let mut scene = scene(4);
        scene.update(1000.0);
        let card = scene.in_flight[0];

        scene.update(1999.0);
        assert!(scene.moved.is_empty());
        assert_eq!(scene.in_flight.len(), 2);

        scene.update(1.0);
        assert_eq!(scene.moved.front(), Some(&card));
    }

    #[test]
    fn partition_holds_across_two_cycles() {
        let mut scene = scene(5);
        // two cycles of 147 s each
        for _ in 0..3000 {
            scene.update(100.0);
            assert_partition(&scene);
        }
    }

    #[test]
    fn full_cycle_restores_the_stack_layout() {
        // keep the reset clear of the next deal tick
        let config = CardStackConfig {
            reset_delay: 500.0,
            ..CardStackConfig::default()
        };
        let mut scene = CardScene::new(config, StdRng::seed_from_u64(6));

        // last deal at 144 s, last landing at 146 s
        for _ in 0..292 {
            scene.update(500.0);
        }
        assert!(scene.remaining.is_empty());
        assert!(scene.in_flight.is_empty());
        assert_eq!(scene.moved.len(), 144);

        // reset at 146.5 s, next deal at 147 s
        scene.update(500.0);
        assert_eq!(scene.remaining.len(), 144);
        assert!(scene.moved.is_empty());
        for (index, card) in scene.remaining.iter().enumerate() {
            let at = position(&scene, *card);
            assert_relative_eq!(at.x, 630.0);
            assert_relative_eq!(at.y, 384.0 + index as f64 * 1.5);
        }

        // first dealt card of the cycle went back to the bottom
        assert_eq!(scene.remaining[0], scene.cards[143]);
    }

    #[test]
    fn reset_is_scheduled_once_per_cycle() {
        let mut scene = scene(8);
        for _ in 0..1460 {
            scene.update(100.0);
        }
        assert!(scene.reset_timer.is_some());
        assert_eq!(scene.timeline.pending_timers(), 2);

        scene.update(1000.0);
        assert!(scene.reset_timer.is_none());
        assert!(scene.moved.is_empty());
    }

    #[test]
    fn dispose_freezes_every_card() {
        let mut scene = scene(7);
        scene.update(5500.0);
        assert!(!scene.in_flight.is_empty());

        scene.dispose();
        let frozen: Vec<Point> = scene.cards.iter().map(|card| position(&scene, *card)).collect();
        scene.update(10_000.0);
        let after: Vec<Point> = scene.cards.iter().map(|card| position(&scene, *card)).collect();

        assert_eq!(frozen, after);
        assert_eq!(scene.timeline.pending_timers(), 0);
        assert_eq!(scene.timeline.active_tweens(), 0);
        assert_partition(&scene);
    }
}
