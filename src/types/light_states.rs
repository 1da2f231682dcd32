//! Aircraft light state flags

use serde::{Deserialize, Serialize};

/// Aircraft light states, bit-compatible with the simulator's light mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LightStates(pub u32);

impl LightStates {
    pub const NONE: LightStates = LightStates(0x0000);
    pub const NAVIGATION: LightStates = LightStates(0x0001);
    pub const BEACON: LightStates = LightStates(0x0002);
    pub const LANDING: LightStates = LightStates(0x0004);
    pub const TAXI: LightStates = LightStates(0x0008);
    pub const STROBE: LightStates = LightStates(0x0010);
    pub const PANEL: LightStates = LightStates(0x0020);
    pub const RECOGNITION: LightStates = LightStates(0x0040);
    pub const WING: LightStates = LightStates(0x0080);
    pub const LOGO: LightStates = LightStates(0x0100);
    pub const CABIN: LightStates = LightStates(0x0200);

    /// Create from a raw simulator mask; unknown bits are kept.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Check if all lights in `lights` are on.
    pub fn contains(&self, lights: LightStates) -> bool {
        (self.0 & lights.0) == lights.0
    }

    /// Switch the given lights on or off.
    pub fn set(&mut self, lights: LightStates, on: bool) {
        if on {
            self.0 |= lights.0;
        } else {
            self.0 &= !lights.0;
        }
    }

    /// Get the raw u32 value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for LightStates {
    type Output = LightStates;

    fn bitor(self, rhs: LightStates) -> LightStates {
        LightStates(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flag_operations_basic() {
        let mut lights = LightStates::NAVIGATION | LightStates::STROBE;
        assert!(lights.contains(LightStates::NAVIGATION));
        assert!(lights.contains(LightStates::STROBE));
        assert!(!lights.contains(LightStates::LANDING));

        lights.set(LightStates::LANDING, true);
        lights.set(LightStates::STROBE, false);
        assert!(lights.contains(LightStates::LANDING));
        assert!(!lights.contains(LightStates::STROBE));
        assert_eq!(lights.value(), 0x0005);
    }

    proptest! {
        #[test]
        fn single_bits_match_raw_mask(value in any::<u32>(), bit in 0..10u32) {
            let lights = LightStates::new(value);
            let flag = LightStates(1 << bit);
            prop_assert_eq!(lights.contains(flag), value & (1 << bit) != 0);
        }
    }
}
