//! Per-thread non-cryptographic RNG (`jsf32`) plus a process-wide seed mint
//! (`sfc32` behind a mutex, mixed with a millisecond clock reading).

use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::math::{Vec2, Vec3};

/// `sfc32`, used only to mint seeds for [`Rng`] instances. Never exposed directly.
struct SeedGenerator {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl SeedGenerator {
    fn new(seed: u32) -> SeedGenerator {
        let mut gen = SeedGenerator {
            a: seed,
            b: seed,
            c: seed,
            d: 1,
        };
        for _ in 0..12 {
            gen.next_u32();
        }
        gen
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let e = self
            .a
            .wrapping_add(self.b)
            .wrapping_add(self.d);
        self.d = self.d.wrapping_add(1);
        self.a = self.b ^ (self.b >> 9);
        self.b = self.c.wrapping_add(self.c << 3);
        self.c = self.c.rotate_left(21).wrapping_add(e);
        e
    }
}

static SEED_MINT: LazyLock<Mutex<SeedGenerator>> =
    LazyLock::new(|| Mutex::new(SeedGenerator::new(0x69C6278F)));

fn next_seed() -> u32 {
    let seed = SEED_MINT.lock().unwrap().next_u32();

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u32)
        .unwrap_or(0);

    seed ^ millis
}

/// `jsf32`: the per-worker random number source. Never shared across threads.
pub struct Rng {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl Rng {
    /// Construct with an explicit seed (deterministic, used by tests).
    pub fn with_seed(seed: u32) -> Rng {
        let mut rng = Rng {
            a: 0xF1EA5EED,
            b: seed,
            c: seed,
            d: seed,
        };
        for _ in 0..20 {
            rng.next_u32();
        }
        rng
    }

    /// Construct from a process-wide minted seed (used by render workers).
    pub fn new() -> Rng {
        Rng::with_seed(next_seed())
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let e = self.a.wrapping_sub(self.b.rotate_left(27));
        self.a = self.b ^ self.c.rotate_left(17);
        self.b = self.c.wrapping_add(self.d);
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }

    /// Rejection-sampled uniform integer in `[0, range)`.
    pub fn next_u32_bounded(&mut self, range: u32) -> u32 {
        let mut x = self.next_u32();
        let mut m = u64::from(x) * u64::from(range);
        let mut l = m as u32;

        if l < range {
            let mut t = range.wrapping_neg();

            if t >= range {
                t -= range;
                if t >= range {
                    t %= range;
                }
            }

            while l < t {
                x = self.next_u32();
                m = u64::from(x) * u64::from(range);
                l = m as u32;
            }
        }

        (m >> 32) as u32
    }

    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    #[inline]
    pub fn next_vector(&mut self) -> Vec3 {
        Vec3::new(
            self.next_f32() - 0.5,
            self.next_f32() - 0.5,
            self.next_f32() - 0.5,
        )
    }

    /// Rejection-sampled point from the cube `[-0.5, 0.5]^3`.
    ///
    /// The name promises the unit ball, but every candidate in the cube already
    /// has `length <= sqrt(0.75) < 1`, so the accept rate is 100% and the
    /// result is uniform in the cube, not the ball. Preserved as specified;
    /// latent because nothing currently consumes this value.
    pub fn next_unit_or_less(&mut self) -> Vec3 {
        loop {
            let candidate = self.next_vector();
            if candidate.length2() <= 1.0 {
                return candidate;
            }
        }
    }

    #[inline]
    pub fn next_unit(&mut self) -> Vec3 {
        self.next_vector().normalize()
    }

    pub fn next_in_unit_disk(&mut self) -> Vec2 {
        loop {
            let candidate = Vec2::new(
                self.next_f32() * 2.0 - 1.0,
                self.next_f32() * 2.0 - 1.0,
            );
            if candidate.length2() < 1.0 {
                return candidate;
            }
        }
    }

    #[inline]
    pub fn next_color(&mut self) -> Vec3 {
        Vec3::new(self.next_f32(), self.next_f32(), self.next_f32())
    }
}

impl Default for Rng {
    fn default() -> Rng {
        Rng::new()
    }
}
