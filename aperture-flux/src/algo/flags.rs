//! Per-algorithm flag tables and the bit sets that carry them.

/// Name and description of one output flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDefinition {
    pub name: &'static str,
    pub doc: &'static str,
}

impl FlagDefinition {
    pub const fn new(name: &'static str, doc: &'static str) -> Self {
        Self { name, doc }
    }
}

/// Index of the general failure flag; every table starts with it.
pub const FAILURE: usize = 0;
pub const APERTURE_TRUNCATED: usize = 1;
pub const SINC_COEFFS_TRUNCATED: usize = 2;

/// Flags of the aperture-style algorithms (multi-radius, naive and sinc).
pub const APERTURE_FLAG_DEFINITIONS: &[FlagDefinition] = &[
    FlagDefinition::new("failed", "general failure flag, set if anything went wrong"),
    FlagDefinition::new(
        "apertureTruncated",
        "aperture did not fit within the measurement image",
    ),
    FlagDefinition::new(
        "sincCoeffsTruncated",
        "full sinc coefficient image did not fit within measurement image",
    ),
];

/// Set of flags, bit `i` standing for entry `i` of a definition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(u32);

impl FlagSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, index: usize) -> Self {
        self.set(index);
        self
    }

    pub fn set(&mut self, index: usize) {
        self.0 |= 1 << index;
    }

    pub fn set_if(&mut self, index: usize, condition: bool) {
        if condition {
            self.set(index);
        }
    }

    pub fn get(&self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Names of the set flags, in table order.
    pub fn names(&self, definitions: &[FlagDefinition]) -> Vec<&'static str> {
        definitions
            .iter()
            .enumerate()
            .filter(|(index, _)| self.get(*index))
            .map(|(_, definition)| definition.name)
            .collect()
    }
}

impl std::ops::BitOr for FlagSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for FlagSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
