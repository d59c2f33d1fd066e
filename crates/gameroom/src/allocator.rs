use commons_core::*;

/// Outcome of one pool's harvest in one round.
#[derive(Debug, Clone, PartialEq)]
pub struct Harvest {
    /// Amount granted to each requester, in request order.
    pub grants: Vec<Stock>,
    /// Total taken out of the pool this round.
    pub harvested: Stock,
    /// Stock left after the harvest, before regeneration.
    pub before: Stock,
    /// Stock after regeneration; the pool's new level.
    pub after: Stock,
    /// Regeneration left nothing: the pool is inert from now on.
    pub depleted: bool,
}

impl Harvest {
    /// Harvest of a pool that is already depleted: nothing granted, nothing grows back.
    pub fn depleted(n: usize) -> Self {
        Self {
            grants: vec![0.; n],
            harvested: 0.,
            before: 0.,
            after: 0.,
            depleted: true,
        }
    }
}

/// Splits `stock` among `requests`, then regenerates what is left.
///
/// When the pool can cover every request, each participant gets exactly
/// what they asked for. Otherwise grants are prorated to the requests,
/// rounded to [`GRANT_PRECISION`] decimals, and the rounding residual is
/// spread from the first participant holding the largest grant onward so
/// the grants sum to `stock` without any grant exceeding its request. The unharvested remainder doubles, capped at `cap`.
pub fn allocate(stock: Stock, requests: &[Request], cap: Stock) -> Harvest {
    let stock = stock.max(0.);
    let total = requests.iter().map(|r| *r as Stock).sum::<Stock>();
    let (grants, harvested) = if total == 0. {
        (vec![0.; requests.len()], 0.)
    } else if total <= stock {
        (requests.iter().map(|r| *r as Stock).collect(), total)
    } else {
        (ration(stock, requests, total), stock)
    };
    let before = round((stock - harvested).max(0.));
    let after = round((before * REGENERATION).min(cap));
    Harvest {
        grants,
        harvested,
        before,
        after,
        depleted: after == 0.,
    }
}

/// Proportional shares of a scarce stock, corrected to sum to `stock`.
///
/// Works in whole hundredths. The rounding residual is walked across the
/// grants one hundredth at a time, largest first, and no grant ever
/// exceeds its request or drops below zero.
fn ration(stock: Stock, requests: &[Request], total: Stock) -> Vec<Stock> {
    let scale = (10 as Stock).powi(GRANT_PRECISION);
    let limits = requests
        .iter()
        .map(|r| (*r as Stock * scale).round() as i64)
        .collect::<Vec<i64>>();
    let mut units = requests
        .iter()
        .zip(limits.iter())
        .map(|(r, limit)| ((stock * (*r as Stock) / total * scale).round() as i64).min(*limit))
        .collect::<Vec<i64>>();
    let mut residual = (stock * scale).round() as i64 - units.iter().sum::<i64>();
    let order = largest(&units);
    while residual != 0 {
        let step = residual.signum();
        let before = residual;
        for i in order.iter().copied() {
            let next = units[i] + step;
            if residual != 0 && (0..=limits[i]).contains(&next) {
                units[i] = next;
                residual -= step;
            }
        }
        if residual == before {
            break;
        }
    }
    units.into_iter().map(|u| u as Stock / scale).collect()
}

/// Grant indices from largest to smallest, earlier first among equals.
fn largest(units: &[i64]) -> Vec<usize> {
    let mut order = (0..units.len()).collect::<Vec<usize>>();
    order.sort_by(|a, b| units[*b].cmp(&units[*a]));
    order
}

/// Rounds to the fixed grant precision.
pub fn round(x: Stock) -> Stock {
    let scale = (10 as Stock).powi(GRANT_PRECISION);
    (x * scale).round() / scale
}
