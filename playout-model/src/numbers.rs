/// Season number as reported by the catalog. Season 0 holds specials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SeasonNumber(u16);

impl SeasonNumber {
    pub fn new(num: u16) -> Self {
        SeasonNumber(num)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn is_specials(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for SeasonNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl From<u16> for SeasonNumber {
    fn from(num: u16) -> Self {
        SeasonNumber(num)
    }
}

impl Default for SeasonNumber {
    fn default() -> Self {
        SeasonNumber(1)
    }
}

/// Episode number within a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EpisodeNumber(u16);

impl EpisodeNumber {
    pub fn new(num: u16) -> Self {
        EpisodeNumber(num)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl From<u16> for EpisodeNumber {
    fn from(num: u16) -> Self {
        EpisodeNumber(num)
    }
}

impl Default for EpisodeNumber {
    fn default() -> Self {
        EpisodeNumber(1)
    }
}

/// Program-guide grouping id. Consecutive playout items that share a group
/// collapse into one guide entry. Values cycle through `0..GuideGroup::MODULUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GuideGroup(u32);

impl GuideGroup {
    pub const MODULUS: u32 = 10_000;

    pub fn new(value: u32) -> Self {
        GuideGroup(value % Self::MODULUS)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        GuideGroup((self.0 + 1) % Self::MODULUS)
    }

    pub fn previous(self) -> Self {
        if self.0 == 0 {
            GuideGroup(Self::MODULUS - 1)
        } else {
            GuideGroup(self.0 - 1)
        }
    }
}

impl std::fmt::Display for GuideGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GuideGroup {
    fn from(value: u32) -> Self {
        GuideGroup::new(value)
    }
}

impl Default for GuideGroup {
    fn default() -> Self {
        GuideGroup(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_group_wraps_both_ways() {
        let last = GuideGroup::new(GuideGroup::MODULUS - 1);
        assert_eq!(last.next(), GuideGroup::new(0));
        assert_eq!(GuideGroup::new(0).previous(), last);
        assert_eq!(GuideGroup::default().next().previous(), GuideGroup::default());
    }

    #[test]
    fn test_season_zero_is_specials() {
        assert!(SeasonNumber::new(0).is_specials());
        assert!(!SeasonNumber::default().is_specials());
        assert_eq!(SeasonNumber::new(3).to_string(), "03");
    }
}
