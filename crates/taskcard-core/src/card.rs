use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Black,
    Yellow,
    Blue,
    Green,
    Pink,
}

/// Palette in the order the edit form lists it.
pub const COLORS: [CardColor; 5] = [
    CardColor::Black,
    CardColor::Yellow,
    CardColor::Blue,
    CardColor::Green,
    CardColor::Pink,
];

impl CardColor {
    pub fn as_str(self) -> &'static str {
        match self {
            CardColor::Black => "black",
            CardColor::Yellow => "yellow",
            CardColor::Blue => "blue",
            CardColor::Green => "green",
            CardColor::Pink => "pink",
        }
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COLORS
            .into_iter()
            .find(|color| color.as_str() == s.trim())
            .ok_or_else(|| anyhow!("unknown card color: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    #[serde(rename = "mo")]
    Mo,
    #[serde(rename = "tu")]
    Tu,
    #[serde(rename = "we")]
    We,
    #[serde(rename = "th")]
    Th,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "sa")]
    Sa,
    #[serde(rename = "su")]
    Su,
}

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mo,
    Weekday::Tu,
    Weekday::We,
    Weekday::Th,
    Weekday::Fr,
    Weekday::Sa,
    Weekday::Su,
];

impl Weekday {
    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Mo => "mo",
            Weekday::Tu => "tu",
            Weekday::We => "we",
            Weekday::Th => "th",
            Weekday::Fr => "fr",
            Weekday::Sa => "sa",
            Weekday::Su => "su",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WEEKDAYS
            .into_iter()
            .find(|day| day.as_str() == s.trim())
            .ok_or_else(|| anyhow!("unknown weekday: {s}"))
    }
}

/// Weekday flags of a card. Days absent from the map count as inactive.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RepeatingDays(BTreeMap<Weekday, bool>);

impl RepeatingDays {
    /// All seven days present and inactive.
    pub fn none() -> Self {
        Self(WEEKDAYS.into_iter().map(|day| (day, false)).collect())
    }

    pub fn is_active(&self, day: Weekday) -> bool {
        self.0.get(&day).copied().unwrap_or(false)
    }

    pub fn set(&mut self, day: Weekday, active: bool) {
        self.0.insert(day, active);
    }

    pub fn toggle(&mut self, day: Weekday) {
        let active = self.is_active(day);
        self.set(day, !active);
    }

    pub fn any_active(&self) -> bool {
        self.0.values().any(|active| *active)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, bool)> + '_ {
        self.0.iter().map(|(day, active)| (*day, *active))
    }
}

impl FromIterator<(Weekday, bool)> for RepeatingDays {
    fn from_iter<I: IntoIterator<Item = (Weekday, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub description: String,

    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub repeating_days: RepeatingDays,

    pub color: CardColor,

    #[serde(default)]
    pub is_archive: bool,

    #[serde(default)]
    pub is_favorite: bool,
}

impl Card {
    pub fn new(description: impl Into<String>, color: CardColor) -> Self {
        Self {
            description: description.into(),
            due_date: None,
            repeating_days: RepeatingDays::none(),
            color,
            is_archive: false,
            is_favorite: false,
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.repeating_days.any_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_days_are_inactive() {
        let days: RepeatingDays = [(Weekday::Mo, true)].into_iter().collect();
        assert!(days.is_active(Weekday::Mo));
        assert!(!days.is_active(Weekday::Fr));
    }

    #[test]
    fn toggle_flips_and_inserts_missing_day() {
        let mut days = RepeatingDays::default();
        days.toggle(Weekday::Sa);
        assert!(days.is_active(Weekday::Sa));
        days.toggle(Weekday::Sa);
        assert!(!days.is_active(Weekday::Sa));
        assert!(!days.any_active());
    }

    #[test]
    fn parses_card_contract_json() {
        let raw = r#"{
            "description": "Buy groceries",
            "dueDate": "2026-03-01T10:30:00Z",
            "repeatingDays": {"mo": false, "we": true},
            "color": "pink",
            "isArchive": true,
            "isFavorite": false
        }"#;

        let card: Card = serde_json::from_str(raw).expect("parse card");
        assert_eq!(card.color, CardColor::Pink);
        assert!(card.due_date.is_some());
        assert!(card.is_repeating());
        assert!(card.repeating_days.is_active(Weekday::We));
        assert!(card.is_archive);
    }

    #[test]
    fn rejects_unknown_color_name() {
        let err = "purple".parse::<CardColor>().expect_err("not in palette");
        assert!(err.to_string().contains("purple"));
        assert_eq!("green".parse::<CardColor>().expect("green"), CardColor::Green);
    }
}
