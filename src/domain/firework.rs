/// A rising shell that bursts into a particle swarm on arrival.
///
/// State machine: ascending (exploded=false, particles empty) →
/// exploded (exploded=true, 80 particles). Never reverts.

use crate::domain::color::Hsl;
use crate::domain::particle::Particle;

/// Particles spawned per burst.
pub const BURST_PARTICLES: usize = 80;

/// Draw radius of the ascending dot, canvas units.
pub const SHELL_RADIUS: f32 = 6.0;

#[derive(Clone, Debug)]
pub struct Firework {
    /// Launch column, fixed for the shell's whole life.
    pub x: f32,
    /// Starts at the canvas bottom, decreases while ascending.
    pub y: f32,
    /// Burst altitude, somewhere in the upper half of the canvas.
    pub target_y: f32,
    /// Ascent per frame, uniform in [4, 8).
    pub speed: f32,
    pub exploded: bool,
    pub particles: Vec<Particle>,
    pub color: Hsl,
}

impl Firework {
    /// Launch from the canvas bottom toward `target_y`.
    pub fn launch(x: f32, target_y: f32, canvas_h: f32, rng: &mut fastrand::Rng) -> Self {
        Firework {
            x,
            y: canvas_h,
            target_y,
            speed: rng.f32() * 4.0 + 4.0,
            exploded: false,
            particles: Vec::new(),
            color: Hsl::shell(rng),
        }
    }

    /// Advance one frame. Returns true on the frame the shell bursts.
    ///
    /// The arrival check is `y <= target_y`: overshoot past the target is
    /// tolerated, not corrected — the burst happens wherever the shell is.
    pub fn update(&mut self, rng: &mut fastrand::Rng) -> bool {
        if !self.exploded {
            self.y -= self.speed;
            if self.y <= self.target_y {
                self.explode(rng);
                return true;
            }
        } else {
            for p in &mut self.particles {
                p.update();
            }
        }
        false
    }

    fn explode(&mut self, rng: &mut fastrand::Rng) {
        self.exploded = true;
        for _ in 0..BURST_PARTICLES {
            self.particles.push(Particle::new(self.x, self.y, self.color, rng));
        }
    }

    /// Exploded and every particle fully faded — safe to drop from the scene.
    pub fn is_spent(&self) -> bool {
        self.exploded && self.particles.iter().all(|p| p.is_spent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> fastrand::Rng {
        fastrand::Rng::with_seed(42)
    }

    #[test]
    fn ascends_until_target() {
        let mut r = rng();
        let mut fw = Firework::launch(50.0, 100.0, 400.0, &mut r);
        assert!(!fw.exploded);
        assert_eq!(fw.y, 400.0);
        let y0 = fw.y;
        assert!(!fw.update(&mut r));
        assert_eq!(fw.y, y0 - fw.speed);
        assert!(fw.particles.is_empty());
    }

    #[test]
    fn bursts_once_and_never_reverts() {
        let mut r = rng();
        let mut fw = Firework::launch(50.0, 390.0, 400.0, &mut r);
        // speed ∈ [4,8) so a 10-unit climb takes at most 3 frames
        let mut bursts = 0;
        for _ in 0..200 {
            if fw.update(&mut r) {
                bursts += 1;
                assert!(fw.exploded);
            }
        }
        assert_eq!(bursts, 1);
        assert!(fw.exploded);
        assert_eq!(fw.particles.len(), BURST_PARTICLES);
    }

    #[test]
    fn burst_particles_share_shell_color() {
        let mut r = rng();
        let mut fw = Firework::launch(50.0, 395.0, 400.0, &mut r);
        while !fw.update(&mut r) {}
        assert!(fw.particles.iter().all(|p| p.color == fw.color));
    }

    #[test]
    fn overshoot_tolerated() {
        let mut r = rng();
        let mut fw = Firework::launch(10.0, 396.0, 400.0, &mut r);
        fw.update(&mut r);
        // One step of speed ≥ 4 from 400 crosses 396 and bursts below it
        assert!(fw.exploded);
        assert!(fw.y <= fw.target_y);
    }

    #[test]
    fn spent_only_when_all_particles_faded() {
        let mut r = rng();
        let mut fw = Firework::launch(50.0, 399.0, 400.0, &mut r);
        while !fw.update(&mut r) {}
        assert!(!fw.is_spent());

        // 67 particle updates drain alpha from 1.0 in 0.015 steps
        for _ in 0..66 {
            fw.update(&mut r);
            assert!(!fw.is_spent());
        }
        fw.update(&mut r);
        assert!(fw.is_spent());
    }

    #[test]
    fn ascending_shell_is_never_spent() {
        let mut r = rng();
        let fw = Firework::launch(50.0, 10.0, 400.0, &mut r);
        assert!(!fw.is_spent());
    }
}
