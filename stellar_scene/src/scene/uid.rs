/// Unique-ID source for scene nodes.
///
/// IDs are random 64-bit values; 0 is never produced. Collisions with a
/// live node are not checked here.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use super::node::Uid;

pub trait UidSource: Send {
    /// Next non-zero ID
    fn next_uid(&mut self) -> Uid;
}

pub struct RandomUidSource {
    rng: StdRng,
}

impl RandomUidSource {
    /// Deterministic sequence when `seed` is set, OS-seeded otherwise
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl UidSource for RandomUidSource {
    fn next_uid(&mut self) -> Uid {
        loop {
            let uid: u64 = self.rng.random();
            if uid != 0 {
                return uid;
            }
        }
    }
}
