//! Cosmetic hit bursts. Coordinates are normalized: `x` along the track
//! (0.0 = hit-line), `y` across the lanes (0.0 = lowest pitch).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seconds a particle lives.
const LIFETIME: f32 = 0.6;
const GRAVITY: f32 = 0.9;
pub const BURST_SIZE: usize = 12;

const PALETTE: [[f32; 3]; 3] = [
    [1.0, 0.84, 0.2],
    [0.2, 0.86, 0.6],
    [1.0, 1.0, 1.0],
];

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining life, 1.0 when spawned.
    pub life: f32,
    pub size: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn burst(&mut self, x: f32, y: f32, count: usize) {
        for i in 0..count {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(0.15..0.45);
            self.particles.push(Particle {
                x,
                y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                life: 1.0,
                size: self.rng.gen_range(2.0..5.0),
                color: PALETTE[i % PALETTE.len()],
            });
        }
    }

    /// Moves and ages every particle, discarding expired ones.
    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.vy -= GRAVITY * dt;
            p.life -= dt / LIFETIME;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_decay_to_nothing() {
        let mut system = ParticleSystem::new(3);
        system.burst(0.2, 0.5, BURST_SIZE);
        assert_eq!(system.particles().len(), BURST_SIZE);
        system.update(0.3);
        assert_eq!(system.particles().len(), BURST_SIZE);
        assert!(system.particles().iter().all(|p| p.life < 1.0));
        system.update(0.31);
        assert!(system.particles().is_empty());
    }
}
