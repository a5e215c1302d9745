// ── Bands and channels ──
//
// Band values are bitmasks so a single entry can say "either 2.4 or
// 5 GHz". Channel 0 always means "let the driver pick".

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Band(u8);

impl Band {
    pub const GHZ_2: Self = Self(1);
    pub const GHZ_5: Self = Self(1 << 1);
    pub const GHZ_6: Self = Self(1 << 2);
    pub const GHZ_60: Self = Self(1 << 3);
    pub const LEGACY: Self = Self(Self::GHZ_2.0 | Self::GHZ_5.0);
    pub const ANY: Self = Self(Self::LEGACY.0 | Self::GHZ_6.0 | Self::GHZ_60.0);

    /// Build from raw bits, `None` if no known band bit is set or unknown bits are.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits & !Self::ANY.0 != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The band a bare channel number implies.
    pub fn for_channel(channel: u16) -> Option<Self> {
        match channel {
            0 => Some(Self::LEGACY),
            1..=14 => Some(Self::GHZ_2),
            15..=165 => Some(Self::GHZ_5),
            _ => None,
        }
    }
}

impl Default for Band {
    fn default() -> Self {
        Self::LEGACY
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::GHZ_2, "2.4GHz"),
            (Self::GHZ_5, "5GHz"),
            (Self::GHZ_6, "6GHz"),
            (Self::GHZ_60, "60GHz"),
        ]
        .into_iter()
        .filter(|(band, _)| self.contains(*band))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Band({self})")
    }
}

/// Channel number for an operating frequency in MHz.
pub fn frequency_to_channel(mhz: u32) -> Option<u16> {
    let channel = match mhz {
        2484 => 14,
        2412..=2472 if (mhz - 2407) % 5 == 0 => (mhz - 2407) / 5,
        5935 => 2,
        5955..=7115 if (mhz - 5950) % 5 == 0 => (mhz - 5950) / 5,
        5000..=5900 if mhz % 5 == 0 => (mhz - 5000) / 5,
        58320..=70200 if (mhz - 56160) % 2160 == 0 => (mhz - 56160) / 2160,
        _ => return None,
    };
    u16::try_from(channel).ok()
}

/// Operating frequency in MHz for a channel within a single band.
pub fn channel_to_frequency(channel: u16, band: Band) -> Option<u32> {
    let ch = u32::from(channel);
    match band {
        Band::GHZ_2 => match channel {
            14 => Some(2484),
            1..=13 => Some(2407 + 5 * ch),
            _ => None,
        },
        Band::GHZ_5 => (32..=177).contains(&channel).then(|| 5000 + 5 * ch),
        Band::GHZ_6 => match channel {
            2 => Some(5935),
            1..=233 => Some(5950 + 5 * ch),
            _ => None,
        },
        Band::GHZ_60 => (1..=6).contains(&channel).then(|| 56160 + 2160 * ch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_for_channel() {
        assert_eq!(Band::for_channel(0), Some(Band::LEGACY));
        assert_eq!(Band::for_channel(6), Some(Band::GHZ_2));
        assert_eq!(Band::for_channel(149), Some(Band::GHZ_5));
        assert_eq!(Band::for_channel(200), None);
    }

    #[test]
    fn band_bits_validation() {
        assert_eq!(Band::from_bits(3), Some(Band::LEGACY));
        assert_eq!(Band::from_bits(0), None);
        assert_eq!(Band::from_bits(16), None);
    }

    #[test]
    fn band_display_lists_members() {
        assert_eq!(Band::LEGACY.to_string(), "2.4GHz|5GHz");
        assert_eq!(Band::GHZ_6.to_string(), "6GHz");
    }

    #[test]
    fn frequency_channel_plan() {
        assert_eq!(frequency_to_channel(2412), Some(1));
        assert_eq!(frequency_to_channel(2484), Some(14));
        assert_eq!(frequency_to_channel(5180), Some(36));
        assert_eq!(frequency_to_channel(5745), Some(149));
        assert_eq!(frequency_to_channel(5955), Some(1));
        assert_eq!(frequency_to_channel(5935), Some(2));
        assert_eq!(frequency_to_channel(60480), Some(2));
        assert_eq!(frequency_to_channel(0), None);
        assert_eq!(frequency_to_channel(2413), None);
    }

    #[test]
    fn channel_frequency_plan() {
        assert_eq!(channel_to_frequency(6, Band::GHZ_2), Some(2437));
        assert_eq!(channel_to_frequency(36, Band::GHZ_5), Some(5180));
        assert_eq!(channel_to_frequency(2, Band::GHZ_6), Some(5935));
        assert_eq!(channel_to_frequency(1, Band::GHZ_60), Some(58320));
        assert_eq!(channel_to_frequency(6, Band::LEGACY), None);
    }
}
