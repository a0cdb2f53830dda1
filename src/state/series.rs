use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar colours for the three series, in slot order (A, B, C).
pub const SERIES_COLORS: [[u8; 3]; 3] = [
    [0xA5, 0xA5, 0xA5], // Grey
    [0xED, 0x7D, 0x31], // Orange
    [0x5B, 0x9B, 0xD5], // Blue
];

/// One of the three fixed year-indexed series of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesSlot {
    A,
    B,
    C,
}

impl SeriesSlot {
    pub const ALL: [SeriesSlot; 3] = [SeriesSlot::A, SeriesSlot::B, SeriesSlot::C];

    pub fn index(&self) -> usize {
        match self {
            SeriesSlot::A => 0,
            SeriesSlot::B => 1,
            SeriesSlot::C => 2,
        }
    }

    pub fn color(&self) -> [u8; 3] {
        SERIES_COLORS[self.index()]
    }

    /// Horizontal offset of this slot's bar within a category group,
    /// in units of the bar width.
    pub fn group_offset(&self) -> f64 {
        self.index() as f64 - 1.0
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesSlot::A => "A",
            SeriesSlot::B => "B",
            SeriesSlot::C => "C",
        }
    }
}

impl fmt::Display for SeriesSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
