use super::{Color, Placement, Point, Renderer};
use rand::Rng;

// ==================== Curves ====================
pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, to: Self, t: f64) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for Color {
    fn lerp(self, to: Self, t: f64) -> Self {
        let (r1, g1, b1) = self.channels();
        let (r2, g2, b2) = to.channels();
        let channel = |a: u8, b: u8| Lerp::lerp(a as f64, b as f64, t).round() as u8;
        Color::from_channels(channel(r1, r2), channel(g1, g2), channel(b1, b2))
    }
}

/// Piecewise linear keyframes over a particle's normalised age (0..=1)
#[derive(Debug, Clone, PartialEq)]
pub struct Curve<T> {
    keys: Vec<(f64, T)>,
}

impl<T: Lerp> Curve<T> {
    pub fn new(mut keys: Vec<(f64, T)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Curve { keys }
    }

    pub fn linear(start: T, end: T) -> Self {
        Curve::new(vec![(0.0, start), (1.0, end)])
    }

    /// `None` only for a curve without keys
    pub fn sample(&self, t: f64) -> Option<T> {
        let first = self.keys.first()?;
        if t <= first.0 {
            return Some(first.1);
        }
        for pair in self.keys.windows(2) {
            let ((t0, v0), (t1, v1)) = (pair[0], pair[1]);
            if t <= t1 {
                let span = t1 - t0;
                let local = if span > 0.0 { (t - t0) / span } else { 1.0 };
                return Some(v0.lerp(v1, local));
            }
        }
        self.keys.last().map(|key| key.1)
    }
}

// ==================== Configuration ====================
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Between {
    pub min: f64,
    pub max: f64,
}

impl Between {
    pub const fn new(min: f64, max: f64) -> Self {
        Between { min, max }
    }

    pub const fn fixed(value: f64) -> Self {
        Between::new(value, value)
    }

    fn pick(&self, rng: &mut impl Rng) -> f64 {
        if self.max > self.min {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Degrees, degrees per second
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationConfig {
    pub start: Between,
    pub speed: Between,
    pub accel: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SpawnShape {
    Point,
    /// uniform angle, distance between `inner_radius` and `radius`
    Torus {
        offset: Point,
        radius: f64,
        inner_radius: f64,
        affect_rotation: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// seconds
    pub lifetime: Between,
    /// seconds between waves
    pub frequency: f64,
    pub particles_per_wave: usize,
    pub max_particles: usize,
    pub origin: Point,
    pub alpha: Curve<f64>,
    /// pixels per second along the start rotation
    pub speed: Between,
    pub scale: Curve<f64>,
    pub min_scale_multiplier: f64,
    pub color: Curve<Color>,
    pub rotation: RotationConfig,
    pub textures: Vec<String>,
    pub spawn_shape: SpawnShape,
}

// shortest wave spacing the emitter accepts
const MIN_FREQUENCY: f64 = 1e-4;

// ==================== Emitter ====================
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Point,
    velocity: Point,
    /// degrees
    pub rotation: f64,
    rotation_speed: f64,
    pub age: f64,
    pub lifetime: f64,
    texture: usize,
    scale_multiplier: f64,
}

impl Particle {
    /// normalised age 0..=1
    pub fn progress(&self) -> f64 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Owns spawn, aging and recycling of particles; the caller only supplies
/// the per-tick delta
pub struct Emitter<R: Rng> {
    config: EmitterConfig,
    particles: Vec<Particle>,
    spawn_timer: f64,
    emitting: bool,
    rng: R,
}

impl<R: Rng> Emitter<R> {
    pub fn new(config: EmitterConfig, rng: R) -> Self {
        Emitter {
            config,
            particles: Vec::new(),
            spawn_timer: 0.0,
            emitting: true,
            rng,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Stop spawning and drop every live particle
    pub fn stop(&mut self) {
        self.emitting = false;
        self.particles.clear();
    }

    /// Advance by `delta` seconds
    pub fn update(&mut self, delta: f64) {
        let accel = self.config.rotation.accel;
        self.particles.retain_mut(|particle| {
            particle.age += delta;
            if particle.age >= particle.lifetime {
                return false;
            }
            particle.position.x += particle.velocity.x * delta;
            particle.position.y += particle.velocity.y * delta;
            particle.rotation_speed += accel * delta;
            particle.rotation += particle.rotation_speed * delta;
            true
        });

        if !self.emitting {
            return;
        }
        let frequency = self.config.frequency.max(MIN_FREQUENCY);
        self.spawn_timer -= delta;
        while self.spawn_timer <= 0.0 {
            for _ in 0..self.config.particles_per_wave {
                if self.particles.len() < self.config.max_particles {
                    let particle = self.spawn();
                    self.particles.push(particle);
                }
            }
            self.spawn_timer += frequency;
        }
    }

    fn spawn(&mut self) -> Particle {
        let config = &self.config;
        let rng = &mut self.rng;

        let mut rotation = config.rotation.start.pick(rng);
        let mut position = config.origin;
        if let SpawnShape::Torus {
            offset,
            radius,
            inner_radius,
            affect_rotation,
        } = config.spawn_shape
        {
            let angle: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let distance = if radius > inner_radius {
                rng.gen_range(inner_radius..radius)
            } else {
                radius
            };
            position.x += offset.x + angle.cos() * distance;
            position.y += offset.y + angle.sin() * distance;
            if affect_rotation {
                rotation = angle.to_degrees();
            }
        }

        let speed = config.speed.pick(rng);
        let direction = rotation.to_radians();
        let texture = if config.textures.len() > 1 {
            rng.gen_range(0..config.textures.len())
        } else {
            0
        };
        let scale_multiplier = if config.min_scale_multiplier < 1.0 {
            rng.gen_range(config.min_scale_multiplier..=1.0)
        } else {
            1.0
        };

        Particle {
            position,
            velocity: Point::new(direction.cos() * speed, direction.sin() * speed),
            rotation,
            rotation_speed: config.rotation.speed.pick(rng),
            age: 0.0,
            lifetime: config.lifetime.pick(rng),
            texture,
            scale_multiplier,
        }
    }

    pub fn alpha_of(&self, particle: &Particle) -> f64 {
        self.config.alpha.sample(particle.progress()).unwrap_or(1.0)
    }

    pub fn scale_of(&self, particle: &Particle) -> f64 {
        self.config.scale.sample(particle.progress()).unwrap_or(1.0) * particle.scale_multiplier
    }

    pub fn color_of(&self, particle: &Particle) -> Color {
        self.config
            .color
            .sample(particle.progress())
            .unwrap_or(Color::WHITE)
    }

    pub fn texture_of(&self, particle: &Particle) -> Option<&str> {
        self.config
            .textures
            .get(particle.texture)
            .map(String::as_str)
    }

    pub fn draw(&self, renderer: &Renderer) {
        for particle in &self.particles {
            let Some(texture) = self.texture_of(particle) else {
                continue;
            };
            let placement = Placement {
                position: particle.position,
                scale: self.scale_of(particle),
                rotation: particle.rotation.to_radians(),
                anchor: Point::new(0.5, 0.5),
            };
            renderer.draw_tinted(
                texture,
                &placement,
                self.alpha_of(particle),
                self.color_of(particle),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> EmitterConfig {
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

    #[test]
    fn curve_samples_between_keys() {
        let curve = Curve::new(vec![(1.0, 0.0), (0.0, 0.62), (0.5, 0.5)]);
        assert_relative_eq!(curve.sample(0.0).unwrap_or_default(), 0.62);
        assert_relative_eq!(curve.sample(0.25).unwrap_or_default(), 0.56);
        assert_relative_eq!(curve.sample(0.75).unwrap_or_default(), 0.25);
        assert_relative_eq!(curve.sample(2.0).unwrap_or_default(), 0.0);
        assert_eq!(Curve::<f64>::new(Vec::new()).sample(0.5), None);
    }

    #[test]
    fn color_curve_blends_channels() {
        let curve = Curve::linear(Color(0xfff191), Color(0xff622c));
        assert_eq!(curve.sample(0.0), Some(Color(0xfff191)));
        assert_eq!(curve.sample(1.0), Some(Color(0xff622c)));
        let (r, g, _) = curve.sample(0.5).unwrap_or_default().channels();
        assert_eq!(r, 0xff);
        assert!(g < 0xf1 && g > 0x62);
    }

    #[test]
    fn never_exceeds_max_particles() {
        let mut emitter = Emitter::new(config(), StdRng::seed_from_u64(7));
        for _ in 0..600 {
            emitter.update(0.016);
            assert!(emitter.particles().len() <= 10);
        }
        assert_eq!(emitter.particles().len(), 10);
    }

    #[test]
    fn spawns_inside_torus_heading_up() {
        let mut emitter = Emitter::new(config(), StdRng::seed_from_u64(11));
        emitter.update(0.0);

        assert_eq!(emitter.particles().len(), 1);
        let particle = &emitter.particles()[0];
        let dx = particle.position.x - 640.0;
        let dy = particle.position.y - 820.0;
        assert!((dx * dx + dy * dy).sqrt() <= 10.0);
        assert!((265.0..275.0).contains(&particle.rotation));
        assert!(particle.velocity.y < -390.0);
        assert!((0.1..0.75).contains(&particle.lifetime));
        assert_relative_eq!(emitter.alpha_of(particle), 0.62);
        assert_relative_eq!(emitter.scale_of(particle), 0.25);
        assert!(emitter.texture_of(particle).is_some());
    }

    #[test]
    fn particles_expire_after_their_lifetime() {
        let mut emitter = Emitter::new(config(), StdRng::seed_from_u64(3));
        emitter.update(0.016);
        emitter.stop();
        assert!(!emitter.is_emitting());
        assert!(emitter.particles().is_empty());

        let mut emitter = Emitter::new(config(), StdRng::seed_from_u64(3));
        emitter.update(0.0);
        emitter.emitting = false;
        emitter.update(0.75);
        assert!(emitter.particles().is_empty());
    }

    #[test]
    fn uses_both_textures() {
        let mut emitter = Emitter::new(config(), StdRng::seed_from_u64(5));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            emitter.update(0.016);
            for particle in emitter.particles() {
                if let Some(texture) = emitter.texture_of(particle) {
                    seen.insert(texture.to_string());
                }
            }
        }
        assert!(seen.contains("particle") && seen.contains("fire"));
    }
}
