//! Comfort levels and time-of-day tags for photo submissions
//!
//! Photo submissions carry a self-reported comfort label drawn from a
//! fixed set. Each label maps to a two-stop gradient and a marker icon; an
//! unknown label is an error rather than a silently missing marker.

use crate::constants::{MARKER_SIZE_DESKTOP, MARKER_SIZE_MOBILE};
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Self-reported thermal comfort, coldest to hottest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComfortLevel {
    Freezing,
    Chilly,
    Comfortable,
    Warm,
    Hot,
    Sweltering,
}

impl ComfortLevel {
    pub const ALL: [ComfortLevel; 6] = [
        ComfortLevel::Freezing,
        ComfortLevel::Chilly,
        ComfortLevel::Comfortable,
        ComfortLevel::Warm,
        ComfortLevel::Hot,
        ComfortLevel::Sweltering,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComfortLevel::Freezing => "Freezing",
            ComfortLevel::Chilly => "Chilly",
            ComfortLevel::Comfortable => "Comfortable",
            ComfortLevel::Warm => "Warm",
            ComfortLevel::Hot => "Hot",
            ComfortLevel::Sweltering => "Sweltering",
        }
    }

    /// Gradient stops as (primary, secondary)
    pub fn gradient(&self) -> (&'static str, &'static str) {
        match self {
            ComfortLevel::Freezing => ("#8CB9F1", "#CFE8FF"),
            ComfortLevel::Chilly => ("#0074B7", "#88D6F0"),
            ComfortLevel::Comfortable => ("#21A348", "#9FEFAF"),
            ComfortLevel::Warm => ("#FFD500", "#FFF3B0"),
            ComfortLevel::Hot => ("#E27100", "#FFB74D"),
            ComfortLevel::Sweltering => ("#6C1D45", "#FF4B4B"),
        }
    }

    /// Marker color on the submissions map
    pub fn marker_color(&self) -> &'static str {
        self.gradient().0
    }

    /// Circular marker icon sized for the viewport
    pub fn marker_icon(&self, mobile: bool) -> MarkerIcon {
        let size = if mobile {
            MARKER_SIZE_MOBILE
        } else {
            MARKER_SIZE_DESKTOP
        };
        MarkerIcon::circle(self.marker_color(), size)
    }
}

impl fmt::Display for ComfortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ComfortLevel {
    type Err = Error;

    /// Case-insensitive label lookup
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ComfortLevel::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::unknown_comfort_level(s))
    }
}

/// A rendered map marker icon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerIcon {
    pub svg: String,
    pub size: u32,
    /// Pixel offset of the anchor point from the top-left corner
    pub anchor: (u32, u32),
}

impl MarkerIcon {
    /// Filled circle with a white outline
    pub fn circle(color: &str, size: u32) -> Self {
        let half = size / 2;
        let radius = half.saturating_sub(2);
        let svg = format!(
            r#"<svg width="{size}" height="{size}" xmlns="http://www.w3.org/2000/svg"><circle cx="{half}" cy="{half}" r="{radius}" fill="{color}" stroke="white" stroke-width="2"/></svg>"#
        );
        Self {
            svg,
            size,
            anchor: (half, half),
        }
    }

    /// Inline `data:` URL for the icon
    pub fn data_url(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(&self.svg))
    }
}

// =============================================================================
// Time of Day
// =============================================================================

/// Coarse period of the day used as an automatic tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Dawn,
    Morning,
    Noon,
    Afternoon,
    Evening,
    Dusk,
    Night,
}

impl TimeOfDay {
    /// Period for an hour of the day (0-23)
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=6 => TimeOfDay::Dawn,
            7..=11 => TimeOfDay::Morning,
            12..=13 => TimeOfDay::Noon,
            14..=16 => TimeOfDay::Afternoon,
            17..=18 => TimeOfDay::Evening,
            19..=21 => TimeOfDay::Dusk,
            _ => TimeOfDay::Night,
        }
    }

    /// Period for a timestamp, using its own local offset
    pub fn from_timestamp(timestamp: &DateTime<FixedOffset>) -> Self {
        Self::from_hour(timestamp.hour())
    }

    pub fn tag(&self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "dawn",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Noon => "noon",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Dusk => "dusk",
            TimeOfDay::Night => "night",
        }
    }
}

/// Tags stored with a photo: user tags, then comfort level, then time of day
pub fn photo_tags(
    user_tags: &[String],
    comfort: ComfortLevel,
    taken_at: &DateTime<FixedOffset>,
) -> Vec<String> {
    let mut tags = user_tags.to_vec();
    tags.push(comfort.label().to_lowercase());
    tags.push(TimeOfDay::from_timestamp(taken_at).tag().to_string());
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_case_insensitively() {
        for level in ComfortLevel::ALL {
            assert_eq!(level.label().parse::<ComfortLevel>().unwrap(), level);
        }
        assert_eq!(
            " sweltering ".parse::<ComfortLevel>().unwrap(),
            ComfortLevel::Sweltering
        );
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let err = "Toasty".parse::<ComfortLevel>().unwrap_err();
        assert!(matches!(err, Error::UnknownComfortLevel { ref label } if label == "Toasty"));
    }

    #[test]
    fn test_every_level_has_a_marker() {
        for level in ComfortLevel::ALL {
            let icon = level.marker_icon(false);
            assert!(icon.svg.contains(level.marker_color()));
            assert!(icon.data_url().starts_with("data:image/svg+xml;base64,"));
        }
        assert_eq!(ComfortLevel::Hot.marker_icon(true).size, 24);
        assert_eq!(ComfortLevel::Hot.marker_icon(false).anchor, (10, 10));
    }

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_hour(7), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Noon);
        assert_eq!(TimeOfDay::from_hour(14), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(19), TimeOfDay::Dusk);
        assert_eq!(TimeOfDay::from_hour(22), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
    }

    #[test]
    fn test_photo_tags_order() {
        let taken_at = DateTime::parse_from_rfc3339("2024-07-04T15:30:00-04:00").unwrap();
        let tags = photo_tags(&["shade".to_string()], ComfortLevel::Hot, &taken_at);
        assert_eq!(tags, vec!["shade", "hot", "afternoon"]);
    }
}
