//! Compare-and-swap expectations for stock rows.

/// Optimistic concurrency expectation for a stock row's quantity.
///
/// A decrement is only applied when the stored quantity still equals the value
/// the caller read; otherwise the writer lost a race and must re-read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExpectedQuantity(i64);

impl ExpectedQuantity {
    pub fn new(quantity: i64) -> Self {
        Self(quantity)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn matches(self, actual: i64) -> bool {
        self.0 == actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_the_exact_quantity() {
        let expected = ExpectedQuantity::new(5);
        assert!(expected.matches(5));
        assert!(!expected.matches(4));
        assert_eq!(expected.value(), 5);
    }
}
