//! Binomial tail sums and swing sequencing
//!
//! Pure functions; nothing here knows about units or the board.

/// P[total damage >= `m`] for `n` independent strikes that each hit with
/// probability `p` for `d` damage
pub fn probability_at_least(m: i32, p: f64, n: u32, d: u32) -> f64 {
    if m <= 0 {
        return 1.0;
    }
    if d == 0 {
        return 0.0;
    }

    let needed = (m as u32).div_ceil(d);
    if needed > n {
        return 0.0;
    }

    let miss = 1.0 - p;
    let mut coefficient = binomial(n, needed);
    let mut total = 0.0;
    for k in needed..=n {
        total += coefficient * p.powi(k as i32) * miss.powi((n - k) as i32);
        coefficient = coefficient * (n - k) as f64 / (k + 1) as f64;
    }
    total.clamp(0.0, 1.0)
}

/// P[`mn` <= total damage < `mx`]
pub fn probability_between(mn: i32, mx: i32, p: f64, n: u32, d: u32) -> f64 {
    (probability_at_least(mn, p, n, d) - probability_at_least(mx, p, n, d)).max(0.0)
}

/// n choose k, built multiplicatively so large n never overflows
fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (1..=k).fold(1.0, |acc, i| acc * (n - k + i) as f64 / i as f64)
}

/// One side of a single-round exchange, as seen by the kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Striker {
    pub hitpoints: u32,
    /// Damage per hit
    pub damage: u32,
    /// Hit probability in 0.0..=1.0
    pub chance: f64,
    pub strikes: u32,
}

/// Interleaved swing order for one round
///
/// `true` marks a swing by the first combatant. The leading side swings
/// first and the two alternate until one runs out; the rest follow.
pub fn swing_schedule(first_strikes: u32, second_strikes: u32, first_leads: bool) -> Vec<bool> {
    let (mut lead, mut follow) = if first_leads {
        (first_strikes, second_strikes)
    } else {
        (second_strikes, first_strikes)
    };
    let mut order = Vec::with_capacity((first_strikes + second_strikes) as usize);
    while lead > 0 || follow > 0 {
        if lead > 0 {
            order.push(first_leads);
            lead -= 1;
        }
        if follow > 0 {
            order.push(!first_leads);
            follow -= 1;
        }
    }
    order
}

/// Probability that `first` lands the killing blow on `second` exactly on
/// global swing `n` (0-based) of the round, with `second` not having
/// killed `first` beforehand
pub fn probability_kill_during_swing(
    first: &Striker,
    second: &Striker,
    first_leads: bool,
    n: usize,
) -> f64 {
    let schedule = swing_schedule(first.strikes, second.strikes, first_leads);
    if schedule.get(n) != Some(&true) || first.damage == 0 {
        return 0.0;
    }

    let own_swings = schedule[..=n].iter().filter(|s| **s).count() as u32;
    let opponent_swings = schedule[..n].iter().filter(|s| !**s).count() as u32;

    let hits_needed = second.hitpoints.max(1).div_ceil(first.damage);
    if own_swings < hits_needed {
        return 0.0;
    }

    // Last needed hit falls on this swing, the others anywhere before it.
    let p = first.chance;
    let kill_now = binomial(own_swings - 1, hits_needed - 1)
        * p.powi(hits_needed as i32)
        * (1.0 - p).powi((own_swings - hits_needed) as i32);

    let survived = 1.0
        - probability_at_least(
            first.hitpoints as i32,
            second.chance,
            opponent_swings,
            second.damage,
        );

    kill_now * survived
}
