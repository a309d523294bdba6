use std::fs;

use chrono::{TimeZone, Utc};
use taskcard_core::cli::Mode;
use taskcard_core::config::DisplayConfig;
use taskcard_core::markup::RenderContext;
use taskcard_core::{load_cards, render_cards};
use tempfile::tempdir;

const CARDS: &str = r#"[
  {
    "description": "Example default task with default color.",
    "dueDate": "2026-02-10T16:15:00Z",
    "repeatingDays": {"mo": false, "tu": false, "we": false, "th": false, "fr": false, "sa": false, "su": false},
    "color": "black",
    "isArchive": false,
    "isFavorite": true
  },
  {
    "description": "It is example of repeating task.",
    "repeatingDays": {"mo": true, "tu": false, "we": true, "th": false, "fr": false, "sa": false, "su": false},
    "color": "yellow",
    "isArchive": true,
    "isFavorite": false
  }
]"#;

#[test]
fn renders_card_file_in_both_modes() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("cards.json");
    fs::write(&path, CARDS).expect("write cards");

    let cards = load_cards(&path).expect("load cards");
    assert_eq!(cards.len(), 2);

    let display = DisplayConfig::default();
    let ctx = RenderContext {
        now: Utc
            .with_ymd_and_hms(2026, 2, 17, 12, 0, 0)
            .single()
            .expect("valid now"),
        display: &display,
    };

    let views = render_cards(&cards, Mode::View, &ctx);
    assert!(views[0].contains("card--deadline"));
    assert!(views[0].contains("<span class=\"card__date\">10 February</span>"));
    assert!(views[0].contains("<span class=\"card__time\">16:15</span>"));
    assert!(views[1].contains("card--repeat"));
    assert!(!views[1].contains("card--deadline"));

    let forms = render_cards(&cards, Mode::Edit, &ctx);
    assert!(forms[0].contains("card--edit"));
    assert!(forms[0].contains("class=\"card__date-deadline\""));
    assert!(forms[1].contains("value=\"mo\" checked"));
    assert!(forms[1].contains("value=\"we\" checked"));
    assert!(!forms[1].contains("type=\"submit\" disabled"));
}

#[test]
fn malformed_card_file_names_the_path() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("broken.json");
    fs::write(&path, r#"[{"description": "no color"}]"#).expect("write cards");

    let err = load_cards(&path).expect_err("color is required");
    assert!(format!("{err:#}").contains("broken.json"));
}
