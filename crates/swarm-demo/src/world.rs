use rand::Rng;
use swarm_engine::coords::Vec2;
use swarm_engine::memory::{Buffer, MemoryError};
use swarm_engine::render::SpriteInstance;

/// Half-extent of the square entities spawn in.
pub const SPAWN_EXTENT: f32 = 1.0;

/// Largest per-step speed along either axis.
pub const MAX_SPEED: f32 = 0.00015;

/// Entity state, allocated once from arena memory.
///
/// `instances` doubles as the GPU instance data, so it is uploaded as is.
pub struct World<'a> {
    instances: &'a mut [SpriteInstance],
    velocities: &'a mut [Vec2],
}

impl<'a> World<'a> {
    /// Arena bytes needed for `count` entities.
    pub const fn bytes_for(count: usize) -> usize {
        count * (size_of::<SpriteInstance>() + size_of::<Vec2>())
    }

    /// Reserves `count` entities from `buffer` and scatters them randomly.
    pub fn spawn(
        buffer: &mut Buffer<'a>,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Self, MemoryError> {
        let instances = buffer.reserve::<SpriteInstance>(count)?;
        let velocities = buffer.reserve::<Vec2>(count)?;

        for (instance, velocity) in instances.iter_mut().zip(velocities.iter_mut()) {
            instance.position = Vec2::new(
                rng.random_range(-SPAWN_EXTENT..=SPAWN_EXTENT),
                rng.random_range(-SPAWN_EXTENT..=SPAWN_EXTENT),
            );
            *velocity = Vec2::new(
                rng.random_range(-MAX_SPEED..=MAX_SPEED),
                rng.random_range(-MAX_SPEED..=MAX_SPEED),
            );
        }

        log::info!("spawned {count} entities");
        Ok(Self {
            instances,
            velocities,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    #[inline]
    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances[..]
    }

    #[inline]
    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities[..]
    }

    /// Moves every entity by its velocity.
    pub fn step(&mut self) {
        for (instance, velocity) in self.instances.iter_mut().zip(self.velocities.iter()) {
            instance.position += *velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use swarm_engine::memory::Arena;

    #[test]
    fn spawn_stays_in_range() {
        // Slack for alignment padding.
        let mut arena = Arena::allocate(World::bytes_for(1000) + 16).unwrap();
        let mut buf = arena.buffer();
        let mut rng = StdRng::seed_from_u64(7);

        let world = World::spawn(&mut buf, 1000, &mut rng).unwrap();

        assert_eq!(world.len(), 1000);
        assert!(world.instances().iter().all(|i| {
            i.position.x.abs() <= SPAWN_EXTENT && i.position.y.abs() <= SPAWN_EXTENT
        }));
        assert!(world
            .velocities()
            .iter()
            .all(|v| v.x.abs() <= MAX_SPEED && v.y.abs() <= MAX_SPEED));
        assert!(buf.allocated() >= World::bytes_for(1000));
    }

    #[test]
    fn step_adds_velocity() {
        let mut arena = Arena::allocate(World::bytes_for(16) + 16).unwrap();
        let mut buf = arena.buffer();
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = World::spawn(&mut buf, 16, &mut rng).unwrap();

        let before: Vec<Vec2> = world.instances().iter().map(|i| i.position).collect();
        world.step();
        world.step();

        for ((after, start), v) in world.instances().iter().zip(&before).zip(world.velocities()) {
            assert!((after.position.x - (start.x + 2.0 * v.x)).abs() < 1e-6);
            assert!((after.position.y - (start.y + 2.0 * v.y)).abs() < 1e-6);
        }
    }

    #[test]
    fn spawn_fails_when_arena_is_too_small() {
        let mut arena = Arena::allocate(World::bytes_for(10) - 1).unwrap();
        let mut buf = arena.buffer();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(matches!(
            World::spawn(&mut buf, 10, &mut rng),
            Err(MemoryError::OutOfCapacity { .. })
        ));
    }

    #[test]
    fn empty_world_is_rejected() {
        let mut arena = Arena::allocate(64).unwrap();
        let mut buf = arena.buffer();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(World::spawn(&mut buf, 0, &mut rng).is_err());
    }
}
