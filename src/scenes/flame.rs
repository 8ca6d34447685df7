use super::{Scene, SceneKind};
use crate::engine::particles::{Between, Curve, Emitter, EmitterConfig, RotationConfig, SpawnShape};
use crate::engine::{Color, Point, Renderer, FRAME_SIZE};
use rand::rngs::StdRng;

// emitter seconds advanced per 60 Hz frame
const TICK_SCALE: f64 = 0.016;

/// Phoenix Flame : ten textured particles rising from one point
pub struct FlameScene {
    emitter: Emitter<StdRng>,
}

pub fn flame_config() -> EmitterConfig {
    EmitterConfig {
        lifetime: Between::new(0.1, 0.75),
        frequency: 0.001,
        particles_per_wave: 1,
        max_particles: 10,
        origin: Point::new(640.0, 820.0),
        alpha: Curve::linear(0.62, 0.0),
        speed: Between::fixed(400.0),
        scale: Curve::linear(0.25, 5.0),
        min_scale_multiplier: 1.0,
        color: Curve::linear(Color(0xfff191), Color(0xff622c)),
        rotation: RotationConfig {
            start: Between::new(265.0, 275.0),
            speed: Between::fixed(50.0),
            accel: 0.0,
        },
        textures: vec!["particle".to_string(), "fire".to_string()],
        spawn_shape: SpawnShape::Torus {
            offset: Point::default(),
            radius: 10.0,
            inner_radius: 0.0,
            affect_rotation: false,
        },
    }
}

impl FlameScene {
    pub fn new(rng: StdRng) -> Self {
        FlameScene {
            emitter: Emitter::new(flame_config(), rng),
        }
    }
}

impl Scene for FlameScene {
    fn kind(&self) -> SceneKind {
        SceneKind::PhoenixFlame
    }

    fn update(&mut self, delta: f64) {
        let frames = delta / FRAME_SIZE;
        self.emitter.update(frames * TICK_SCALE);
    }

    fn draw(&self, renderer: &Renderer) {
        self.emitter.draw(renderer);
    }

    fn dispose(&mut self) {
        self.emitter.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn one_frame_advances_particles_by_a_tick() {
        let mut scene = FlameScene::new(StdRng::seed_from_u64(1));
        scene.update(FRAME_SIZE);

        // spawned this frame, not aged yet
        let particles = scene.emitter.particles();
        assert!(!particles.is_empty());
        scene.update(FRAME_SIZE);
        let oldest = &scene.emitter.particles()[0];
        assert_relative_eq!(oldest.age, TICK_SCALE, epsilon = 1e-9);
    }

    #[test]
    fn flame_never_exceeds_ten_particles() {
        let mut scene = FlameScene::new(StdRng::seed_from_u64(2));
        for _ in 0..300 {
            scene.update(FRAME_SIZE);
            assert!(scene.emitter.particles().len() <= 10);
        }
        assert_eq!(scene.emitter.particles().len(), 10);
    }

    #[test]
    fn particles_rise_from_the_origin() {
        let mut scene = FlameScene::new(StdRng::seed_from_u64(3));
        scene.update(FRAME_SIZE);
        for _ in 0..3 {
            scene.update(FRAME_SIZE);
        }
        for particle in scene.emitter.particles() {
            assert!(particle.position.y < 830.0);
            assert!((600.0..680.0).contains(&particle.position.x));
        }
    }

    #[test]
    fn dispose_stops_and_clears() {
        let mut scene = FlameScene::new(StdRng::seed_from_u64(4));
        scene.update(100.0);

        scene.dispose();
        scene.update(100.0);

        assert!(!scene.emitter.is_emitting());
        assert!(scene.emitter.particles().is_empty());
        assert_eq!(scene.kind(), SceneKind::PhoenixFlame);
    }
}
