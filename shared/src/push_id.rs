use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

pub const PUSH_ID_LENGTH: usize = TIME_CHARS + RANDOM_CHARS;

/// Generates child keys that sort in creation order.
///
/// The first 8 characters encode the millisecond timestamp, the last 12 are
/// random. Keys minted within the same millisecond reuse the previous random
/// part incremented by one, so they still sort after each other.
#[derive(Debug, Clone)]
pub struct PushIdGenerator {
    last_ms: Option<u64>,
    last_random: [u8; RANDOM_CHARS],
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self {
            last_ms: None,
            last_random: [0; RANDOM_CHARS],
        }
    }
}

impl PushIdGenerator {
    pub fn next_id<R: Rng>(&mut self, now_ms: u64, rng: &mut R) -> String {
        if self.last_ms == Some(now_ms) {
            self.increment_random();
        } else {
            for slot in &mut self.last_random {
                *slot = rng.gen_range(0..64);
            }
        }
        self.last_ms = Some(now_ms);

        let mut id = [0u8; PUSH_ID_LENGTH];
        let mut ts = now_ms;
        for slot in id[..TIME_CHARS].iter_mut().rev() {
            *slot = PUSH_CHARS[(ts % 64) as usize];
            ts /= 64;
        }
        for (slot, &r) in id[TIME_CHARS..].iter_mut().zip(&self.last_random) {
            *slot = PUSH_CHARS[r as usize];
        }

        id.iter().map(|&b| b as char).collect()
    }

    fn increment_random(&mut self) {
        for slot in self.last_random.iter_mut().rev() {
            if *slot == 63 {
                *slot = 0;
            } else {
                *slot += 1;
                return;
            }
        }
    }
}
