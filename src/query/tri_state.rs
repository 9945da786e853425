/// Result of evaluating a filter against one resource
///
/// `Denied` means a referenced attribute is hidden from the caller. It is
/// neither true nor false, so it survives negation and only gives way to
/// a result that fixes the outcome without it (`false` under AND, `true`
/// under OR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    True,
    False,
    Denied,
}

impl TriState {
    pub fn and(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::False, _) | (_, TriState::False) => TriState::False,
            (TriState::True, TriState::True) => TriState::True,
            _ => TriState::Denied,
        }
    }

    pub fn or(self, other: TriState) -> TriState {
        match (self, other) {
            (TriState::True, _) | (_, TriState::True) => TriState::True,
            (TriState::False, TriState::False) => TriState::False,
            _ => TriState::Denied,
        }
    }

    pub fn negate(self) -> TriState {
        match self {
            TriState::True => TriState::False,
            TriState::False => TriState::True,
            TriState::Denied => TriState::Denied,
        }
    }

    /// Whether a resource with this result belongs in the result set.
    /// `Denied` fails closed.
    pub fn is_match(self) -> bool {
        self == TriState::True
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TriState::{self, Denied, False, True};

    const ALL: [TriState; 3] = [True, False, Denied];

    #[test]
    fn test_and_table() {
        assert_eq!(Denied.and(False), False);
        assert_eq!(Denied.and(True), Denied);
        assert_eq!(Denied.and(Denied), Denied);
        assert_eq!(True.and(True), True);
        assert_eq!(True.and(False), False);
    }

    #[test]
    fn test_or_table() {
        assert_eq!(Denied.or(True), True);
        assert_eq!(Denied.or(False), Denied);
        assert_eq!(Denied.or(Denied), Denied);
        assert_eq!(False.or(False), False);
        assert_eq!(False.or(True), True);
    }

    #[test]
    fn test_combinators_are_commutative() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a.and(b), b.and(a));
                assert_eq!(a.or(b), b.or(a));
            }
        }
    }

    #[test]
    fn test_negation_keeps_denied() {
        assert_eq!(Denied.negate(), Denied);
        assert_eq!(True.negate(), False);
        assert_eq!(False.negate(), True);
        for a in ALL {
            assert_eq!(a.negate().negate(), a);
        }
    }

    #[test]
    fn test_only_true_matches() {
        assert!(True.is_match());
        assert!(!False.is_match());
        assert!(!Denied.is_match());
    }
}
