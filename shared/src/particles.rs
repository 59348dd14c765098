//! Sparkle brush: each burst scatters a handful of small colored dots around
//! the pointer.

use std::f32::consts::TAU;

use rand::Rng;

use crate::brush::Color;
use crate::Point;

pub const PARTICLES_PER_BURST: usize = 5;
pub const MIN_PARTICLE_RADIUS: f32 = 1.0;
pub const MAX_PARTICLE_RADIUS: f32 = 4.0;

pub const SPARKLE_COLORS: [Color; 5] = [
    Color::rgb(0xff, 0xd7, 0x00),
    Color::rgb(0xff, 0x6b, 0x6b),
    Color::rgb(0xc3, 0xb1, 0xe1),
    Color::rgb(0x77, 0xdd, 0x77),
    Color::rgb(0xa7, 0xc7, 0xe7),
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub center: Point,
    pub radius: f32,
    pub color: Color,
}

pub fn sparkle_burst<R: Rng>(
    rng: &mut R,
    center: Point,
    brush_width: f32,
) -> [Particle; PARTICLES_PER_BURST] {
    let spread = (brush_width / 2.0).max(0.0);
    std::array::from_fn(|_| {
        let angle = rng.gen_range(0.0..TAU);
        let distance = if spread > 0.0 {
            rng.gen_range(0.0..=spread)
        } else {
            0.0
        };
        let radius = rng.gen_range(MIN_PARTICLE_RADIUS..MAX_PARTICLE_RADIUS);
        let color = SPARKLE_COLORS[rng.gen_range(0..SPARKLE_COLORS.len())];
        Particle {
            center: Point {
                x: center.x + angle.cos() * distance,
                y: center.y + angle.sin() * distance,
            },
            radius,
            color,
        }
    })
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn bursts_stay_within_half_the_brush_width() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = Point::new(100.0, 80.0);
        for _ in 0..200 {
            for particle in sparkle_burst(&mut rng, center, 30.0) {
                let dx = particle.center.x - center.x;
                let dy = particle.center.y - center.y;
                assert!((dx * dx + dy * dy).sqrt() <= 15.0 + 1e-3);
                assert!(particle.radius >= MIN_PARTICLE_RADIUS);
                assert!(particle.radius < MAX_PARTICLE_RADIUS);
                assert!(SPARKLE_COLORS.contains(&particle.color));
            }
        }
    }

    #[test]
    fn zero_width_brush_stacks_particles_on_the_center() {
        let mut rng = StdRng::seed_from_u64(1);
        let center = Point::new(3.0, 4.0);
        for particle in sparkle_burst(&mut rng, center, 0.0) {
            assert!((particle.center.x - 3.0).abs() < 1e-6);
            assert!((particle.center.y - 4.0).abs() < 1e-6);
        }
    }

    #[test]
    fn bursts_use_more_than_one_color() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = Vec::new();
        for _ in 0..50 {
            for particle in sparkle_burst(&mut rng, Point::new(0.0, 0.0), 12.0) {
                if !seen.contains(&particle.color) {
                    seen.push(particle.color);
                }
            }
        }
        assert!(seen.len() > 1);
    }
}
