use rand::seq::SliceRandom;
use rand::Rng;

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Split a total quantity into `day_count` daily fragments.
///
/// Integer mode truncates the total and hands out whole units: every day
/// gets `total / day_count`, and the remainder is distributed one unit each
/// to randomly chosen days, so the fragments sum back exactly. When the
/// truncated total is smaller than `day_count`, the result is that many
/// one-unit fragments, shorter than requested. Callers must size their day
/// selection to the returned length.
///
/// Fractional mode draws uniform weights in `[0.8, 1.2)`, allocates
/// proportionally rounded to one decimal (flooring a rounded zero to `0.1`
/// when the total exceeds 1), and lets the last fragment absorb all
/// residual rounding error.
pub fn split_quantity<R: Rng + ?Sized>(
    total_qty: f64,
    day_count: usize,
    integer_mode: bool,
    rng: &mut R,
) -> Vec<f64> {
    if day_count <= 1 {
        return vec![total_qty];
    }

    if integer_mode {
        let total_int = total_qty.trunc() as i64;
        if total_int < day_count as i64 {
            return vec![1.0; total_int.max(0) as usize];
        }

        let base = total_int / day_count as i64;
        let remainder = (total_int % day_count as i64) as usize;

        let mut amounts = vec![base as f64; day_count];
        let mut indices: Vec<usize> = (0..day_count).collect();
        indices.shuffle(rng);
        for &idx in indices.iter().take(remainder) {
            amounts[idx] += 1.0;
        }
        amounts
    } else {
        let weights: Vec<f64> = (0..day_count).map(|_| rng.gen_range(0.8..1.2)).collect();
        let weight_sum: f64 = weights.iter().sum();

        let mut amounts = Vec::with_capacity(day_count);
        let mut running_sum = 0.0;
        for weight in &weights[..day_count - 1] {
            let mut value = round1(weight / weight_sum * total_qty);
            if value == 0.0 && total_qty > 1.0 {
                value = 0.1;
            }
            amounts.push(value);
            running_sum += value;
        }
        // Last day absorbs the accumulated rounding error.
        amounts.push(round1(total_qty - running_sum));
        amounts
    }
}

/// How many of the available days a row of the given quantity is spread
/// over. Small quantities land on a single day; mid-range quantities on 2-4
/// days; large quantities on 3-10. The count never exceeds `total_days`:
/// when the available range is smaller than a tier's floor, the count
/// clamps to the range instead.
pub fn active_day_count<R: Rng + ?Sized>(qty: f64, total_days: usize, rng: &mut R) -> usize {
    if qty <= 3.0 {
        return 1;
    }

    let (low, high) = if qty <= 10.0 {
        (2, total_days.min(4))
    } else {
        (3, total_days.min(10))
    };

    if high <= low {
        return high.max(1);
    }
    rng.gen_range(low..=high)
}

/// Choose `count` distinct day indices from `[0, total_days)`, ascending.
pub fn pick_day_indices<R: Rng + ?Sized>(
    total_days: usize,
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut indices = rand::seq::index::sample(rng, total_days, count.min(total_days)).into_vec();
    indices.sort_unstable();
    indices
}
