//! IdGenerator port - ID 生成の抽象化
//!
//! プロセス全体で共有される乱数源は使わず、生成器ごとに `StdRng` を持たせます。
//! シードと `FixedClock` を与えれば生成される ID は完全に決定的になります。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ulid::Ulid;

use crate::domain::ActiveObjectId;
use crate::ports::Clock;

/// IdGenerator は active object の ID を生成
///
/// 生成器は自分の乱数状態を持つので `&mut self` を取る。
pub trait IdGenerator: Send {
    fn generate_active_object_id(&mut self) -> ActiveObjectId;
}

/// UlidGenerator は Clock の時刻 + 自前の乱数で ULID を作る
pub struct UlidGenerator<C> {
    clock: C,
    rng: StdRng,
}

impl<C: Clock> UlidGenerator<C> {
    /// Deterministic generator for a given seed.
    pub fn seeded(clock: C, seed: u64) -> Self {
        Self {
            clock,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy(clock: C) -> Self {
        Self {
            clock,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_active_object_id(&mut self) -> ActiveObjectId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, self.rng.r#gen());
        ActiveObjectId::from(ulid)
    }
}
