//! Headless perception demo
//!
//! Random walkers roam a square world. Every tick runs the mutation phase
//! (move + reorder + commit) followed by a parallel perception phase in which
//! each walker culls the tree through its view cone.
//!
//! Usage: jasim_perception_demo [walkers] [ticks]

use std::time::Instant;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;
use jasim_perception::glam::Vec2;
use jasim_perception::jasim::{Engine, Environment, Result, TreeConfig};
use jasim_perception::jasim::frustum::{CircleFrustum2d, FrontConeFrustum2d, Frustum2d, FrustumId};
use jasim_perception::jasim::geometry::{Aabb2, QuadSpace};
use jasim_perception::jasim::log::{DefaultLogger, LogSeverity};
use jasim_perception::jasim::tree::EntityKey;

const SOURCE: &str = "demo";
const WORLD_SIZE: f32 = 1000.0;
const WALKER_RADIUS: f32 = 1.5;
const MAX_SPEED: f32 = 4.0;
const VIEW_DISTANCE: f32 = 40.0;
const HALF_APERTURE: f32 = 0.6;
const REPORT_EVERY: u64 = 10;

struct Walker {
    key: EntityKey,
    position: Vec2,
    velocity: Vec2,
    frustum: Frustum2d,
}

impl Walker {
    fn bounds(&self) -> Aabb2 {
        Aabb2::from_center(self.position, WALKER_RADIUS)
    }

    /// Advance one step, bouncing off the world edges
    fn step(&mut self, rng: &mut SmallRng) {
        let turn = Vec2::from_angle(rng.gen_range(-0.2..0.2));
        self.velocity = turn.rotate(self.velocity);
        self.position += self.velocity;
        for axis in 0..2 {
            if self.position[axis] < 0.0 || self.position[axis] > WORLD_SIZE {
                self.velocity[axis] = -self.velocity[axis];
                self.position[axis] = self.position[axis].clamp(0.0, WORLD_SIZE);
            }
        }
        self.frustum = self.frustum.moved_to(self.position, self.velocity);
    }
}

fn spawn(count: usize, rng: &mut SmallRng) -> Vec<Walker> {
    let mut keys: SlotMap<EntityKey, ()> = SlotMap::with_key();
    (0..count)
        .map(|i| {
            let position = Vec2::new(rng.gen_range(0.0..WORLD_SIZE), rng.gen_range(0.0..WORLD_SIZE));
            let velocity = Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
                * rng.gen_range(0.5..MAX_SPEED);
            let id = FrustumId(i as u64);
            // one walker in ten looks all around
            let frustum = if i % 10 == 0 {
                Frustum2d::from(CircleFrustum2d::new(id, position, VIEW_DISTANCE * 0.5))
            } else {
                Frustum2d::from(FrontConeFrustum2d::new(id, position, velocity, HALF_APERTURE, 0.0, VIEW_DISTANCE))
            };
            Walker { key: keys.insert(()), position, velocity, frustum }
        })
        .collect()
}

fn run(walker_count: usize, ticks: u64) -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0x5EED);
    let mut walkers = spawn(walker_count, &mut rng);

    let world = Aabb2::new(Vec2::ZERO, Vec2::splat(WORLD_SIZE));
    let mut env = Environment::<QuadSpace>::new("demo", world, TreeConfig::default())?;
    env.mutate(|m| {
        for walker in &walkers {
            m.insert(&(walker.key, walker.bounds()));
        }
    });

    let started = Instant::now();
    for _ in 0..ticks {
        // Mutation phase
        for walker in walkers.iter_mut() {
            walker.step(&mut rng);
        }
        let moved = env.mutate(|m| m.reorder_entities(walkers.iter().map(|w| (w.key, w.bounds()))));

        // Perception phase
        let queries: Vec<(EntityKey, Frustum2d)> = walkers.iter().map(|w| (w.key, w.frustum)).collect();
        let perceptions = env.perceive_all(&queries);

        if env.tick() % REPORT_EVERY == 0 {
            // the perceiver itself is always in its own results
            let seen: usize = queries
                .iter()
                .zip(&perceptions)
                .map(|((key, _), results)| results.iter().filter(|r| r.entity != *key && r.is_visible()).count())
                .sum();
            let stats = env.last_commit();
            Engine::log(
                LogSeverity::Info,
                SOURCE,
                format!(
                    "tick {:>4}: {} moved across nodes, {} nodes (depth {}), {} splits / {} merges, {:.2} seen per walker",
                    env.tick(),
                    moved,
                    env.tree().node_count(),
                    env.tree().depth(),
                    stats.splits,
                    stats.merges,
                    seen as f64 / walker_count.max(1) as f64
                ),
            );
        }
    }

    let elapsed = started.elapsed();
    Engine::log(
        LogSeverity::Info,
        SOURCE,
        format!(
            "{} ticks of {} walkers in {:.1?} ({:.1?} per tick)",
            ticks,
            walker_count,
            elapsed,
            elapsed / ticks.max(1) as u32
        ),
    );
    Ok(())
}

fn main() {
    Engine::set_logger(DefaultLogger::with_min_severity(LogSeverity::Info));

    let mut args = std::env::args().skip(1);
    let walkers = args.next().and_then(|a| a.parse().ok()).unwrap_or(2000);
    let ticks = args.next().and_then(|a| a.parse().ok()).unwrap_or(100);

    if let Err(e) = run(walkers, ticks) {
        Engine::log(LogSeverity::Error, SOURCE, format!("demo failed: {}", e));
        std::process::exit(1);
    }
}
