use serde::{Deserialize, Serialize};

/// Paddle command chosen for one tick.
///
/// The discriminants match the output indices of the agent network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant)]
pub enum Action {
    /// Move toward the decreasing coordinate (up the screen).
    MoveDecreasing = 0,
    /// Stay in place.
    Hold = 1,
    /// Move toward the increasing coordinate (down the screen).
    MoveIncreasing = 2,
}

impl Action {
    pub const ALL: [Self; 3] = [Self::MoveDecreasing, Self::Hold, Self::MoveIncreasing];

    /// Returns the action for a network output index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Signed unit step applied to the paddle's vertical position.
    #[must_use]
    pub const fn direction(self) -> f64 {
        match self {
            Self::MoveDecreasing => -1.0,
            Self::Hold => 0.0,
            Self::MoveIncreasing => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(*action as usize, i);
            assert_eq!(Action::from_index(i), Some(*action));
        }
        assert_eq!(Action::from_index(3), None);
    }
}
