use std::cmp::Ordering;

/// Total-order adapter for cost sort keys.
///
/// Costs are only required to be partially ordered; incomparable pairs (such
/// as NaN-valued float costs) compare as equal here, so comparison-heavy
/// sorts get a deterministic tiebreak instead of a panic.
#[derive(Clone, Copy, Debug)]
pub struct OrderedCost<T: PartialOrd>(pub T);

impl<T: PartialOrd> PartialEq for OrderedCost<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: PartialOrd> Eq for OrderedCost<T> {}

impl<T: PartialOrd> PartialOrd for OrderedCost<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: PartialOrd> Ord for OrderedCost<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedCost;

    #[test]
    fn sorts_finite_costs_ascending() {
        let mut costs = vec![OrderedCost(3.0f32), OrderedCost(1.0), OrderedCost(2.0)];
        costs.sort();
        assert_eq!(costs[0].0, 1.0);
        assert_eq!(costs[2].0, 3.0);
    }

    #[test]
    fn nan_ties_instead_of_panicking() {
        let mut costs = vec![OrderedCost(f32::NAN), OrderedCost(1.0), OrderedCost(f32::NAN)];
        costs.sort();
        assert_eq!(costs.len(), 3);
    }
}
