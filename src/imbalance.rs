use num_traits::ToPrimitive;
use num_traits::Zero;
use std::ops::AddAssign;

/// Total weight of each block of a two-way partition.
pub fn block_weights<W>(partition: &[usize], weights: W) -> [W::Item; 2]
where
    W: IntoIterator,
    W::Item: Zero + Clone + AddAssign,
{
    let mut loads = [W::Item::zero(), W::Item::zero()];

    for (&block, w) in partition.iter().zip(weights.into_iter()) {
        debug_assert!(block < 2);
        loads[block] += w;
    }

    loads
}

/// Deviation of a two-way partition from the requested split.
///
/// Returns `|W0 / W - target_split|`, where `W0` is the weight of block
/// 0 and `W` the total weight. Zero for an empty input.
pub fn imbalance<W>(target_split: f64, partition: &[usize], weights: W) -> f64
where
    W: IntoIterator,
    W::Item: Zero + Clone + AddAssign + ToPrimitive,
{
    let [w0, w1] = block_weights(partition, weights);
    let w0 = w0.to_f64().unwrap_or(0.0);
    let w1 = w1.to_f64().unwrap_or(0.0);
    let total = w0 + w1;
    if total == 0.0 {
        return 0.0;
    }

    (w0 / total - target_split).abs()
}
