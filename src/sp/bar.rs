/// The amount of Star Power held, in full bars, as a best and worst case.
/// At most one bar can be held; surplus income is lost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpBar {
    pub min: f64,
    pub max: f64,
}

/// The fraction of a bar needed before an activation may begin.
pub const MINIMUM_SP_AMOUNT: f64 = 0.5;

impl SpBar {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }.clamped()
    }

    pub fn empty() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    pub fn full_enough_to_activate(&self) -> bool {
        self.min >= MINIMUM_SP_AMOUNT
    }

    /// Credit a phrase grant to both bounds.
    pub fn add_phrase(&mut self, amount: f64) {
        self.min += amount;
        self.max += amount;
        *self = self.clamped();
    }

    fn clamped(self) -> Self {
        let max = self.max.clamp(0.0, 1.0);
        Self {
            min: self.min.clamp(0.0, max),
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_grants_clamp_at_one_bar() {
        let mut bar = SpBar::new(1.0, 1.0);
        bar.add_phrase(0.25);
        assert_eq!(bar, SpBar::new(1.0, 1.0));
        bar.add_phrase(0.25);
        assert_eq!(bar, SpBar::new(1.0, 1.0));
    }

    #[test]
    fn half_bar_threshold_is_exact() {
        assert!(SpBar::new(0.5, 0.5).full_enough_to_activate());
        assert!(!SpBar::new(0.499_999, 0.6).full_enough_to_activate());
    }

    #[test]
    fn min_never_exceeds_max() {
        let bar = SpBar::new(0.8, 0.3);
        assert!(bar.min <= bar.max);
    }
}
