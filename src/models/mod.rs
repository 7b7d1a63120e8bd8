use chrono::{DateTime, Utc};
use serde::Serialize;

/// Geographic search area, encoded into the `bounds` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub north: f64,
    pub east: f64,
    pub south: f64,
}

impl BoundingBox {
    /// Four coordinates joined by underscores, the format the search page expects.
    pub fn bounds_param(&self) -> String {
        format!("{}_{}_{}_{}", self.west, self.north, self.east, self.south)
    }
}

/// One monitoring configuration, built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SearchTarget {
    pub title: String,
    /// Telegram chat id notifications for this target go to.
    pub telegram_id: String,
    pub search_url: String,
    /// Listing ids that must never appear in a notification.
    pub ignored_ids: Vec<u64>,
    /// Keep only listings strictly cheaper than this, in EUR.
    pub max_price: Option<f64>,
    pub colocative_only: bool,
}

/// Listing price as shown on the card: a parsed EUR amount, or the raw badge
/// text when the page shows a non-numeric label ("Sur demande").
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Price {
    Eur(f64),
    Text(String),
}

/// One housing unit parsed from a result card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// Trailing segment of the detail-page link; absent when unparsable.
    pub id: Option<u64>,
    pub title: String,
    pub image_url: Option<String>,
    pub price: Option<Price>,
    /// Address plus ancillary detail lines, one per line.
    pub overview_details: String,
    pub is_colocative: bool,
}

/// Outcome of parsing one search-results page. The listing sequence may be
/// shorter than the reported count when individual cards fail to parse.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsSummary {
    pub search_url: String,
    pub count: Option<u32>,
    pub headline_price: Option<f64>,
    pub listings: Vec<Listing>,
    pub extracted_at: DateTime<Utc>,
}

/// Rendered notification message, ready for the channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_param_joins_coordinates_with_underscores() {
        let bbox = BoundingBox {
            west: 1.5,
            north: 2.5,
            east: 3.5,
            south: 4.5,
        };
        assert_eq!(bbox.bounds_param(), "1.5_2.5_3.5_4.5");
    }

    #[test]
    fn bounds_param_keeps_full_precision() {
        let bbox = BoundingBox {
            west: 4.679270004578094,
            north: 45.940645781504905,
            east: 5.063104843445282,
            south: 45.5231871493864,
        };
        assert_eq!(
            bbox.bounds_param(),
            "4.679270004578094_45.940645781504905_5.063104843445282_45.5231871493864"
        );
    }
}
