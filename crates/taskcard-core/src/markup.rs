//! Markup for both card modes.
//!
//! Every builder is a pure function of its arguments. Components locate
//! their controls through the class names listed on [`Control`], so those
//! names must stay in sync with the templates below.
//!
//! [`Control`]: crate::dom::Control

use chrono::{DateTime, Utc};
use maud::{Markup, PreEscaped, html};

use crate::card::{COLORS, Card, CardColor, RepeatingDays, WEEKDAYS, Weekday};
use crate::config::DisplayConfig;
use crate::derived;
use crate::state::EditState;

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub now: DateTime<Utc>,
    pub display: &'a DisplayConfig,
}

pub fn build_color_options(palette: &[CardColor], selected: CardColor) -> Markup {
    html! {
        @for (index, color) in palette.iter().enumerate() {
            @let id = format!("color-{}-{}", color.as_str(), index);
            input
                type="radio"
                id=(id)
                class={ "card__color-input card__color-input--" (color.as_str()) " visually-hidden" }
                name="color"
                value=(color.as_str())
                checked[*color == selected];
            label for=(id) class={ "card__color card__color--" (color.as_str()) } {
                (color.as_str())
            }
        }
    }
}

pub fn build_repeat_day_options(order: &[Weekday], active_days: &RepeatingDays) -> Markup {
    html! {
        @for (index, day) in order.iter().enumerate() {
            @let id = format!("repeat-{}-{}", day.as_str(), index);
            input
                class="visually-hidden card__repeat-day-input"
                type="checkbox"
                id=(id)
                name="repeat"
                value=(day.as_str())
                checked[active_days.is_active(*day)];
            label class="card__repeat-day" for=(id) { (day.as_str()) }
        }
    }
}

pub fn build_edit_form_markup(card: &Card, state: &EditState, ctx: &RenderContext<'_>) -> Markup {
    let due = card.due_date.filter(|_| state.is_date_showing);
    let deadline = due
        .map(|due| {
            format!(
                "{} {}",
                ctx.display.format_date(due),
                ctx.display.format_time(due)
            )
        })
        .unwrap_or_default();

    let is_save_blocked = state.is_save_blocked(card);
    let class = card_class(
        state.color,
        true,
        state.is_repeating_card,
        derived::is_expired(card.due_date, ctx.now),
    );

    html! {
        article class=(class) {
            form.card__form method="get" {
                div.card__inner {
                    (color_bar())
                    div.card__textarea-wrap {
                        label {
                            textarea.card__text placeholder=(ctx.display.placeholder) name="text" {
                                (card.description)
                            }
                        }
                    }
                    div.card__settings {
                        div.card__details {
                            div.card__dates {
                                button.card__date-deadline-toggle type="button" {
                                    "date: "
                                    span.card__date-status { (yes_no(state.is_date_showing)) }
                                }
                                @if state.is_date_showing {
                                    fieldset.card__date-deadline {
                                        label.card__input-deadline-wrap {
                                            input.card__date type="text" placeholder="" name="date" value=(deadline);
                                        }
                                    }
                                }
                                button.card__repeat-toggle type="button" {
                                    "repeat: "
                                    span.card__repeat-status { (yes_no(state.is_repeating_card)) }
                                }
                                @if state.is_repeating_card {
                                    fieldset.card__repeat-days {
                                        div.card__repeat-days-inner {
                                            (build_repeat_day_options(&WEEKDAYS, &state.active_repeating_days))
                                        }
                                    }
                                }
                            }
                        }
                        div.card__colors-inner {
                            h3.card__colors-title { "Color" }
                            div.card__colors-wrap {
                                (build_color_options(&COLORS, state.color))
                            }
                        }
                    }
                    div.card__status-btns {
                        button.card__save type="submit" disabled[is_save_blocked] { "save" }
                        button.card__delete type="button" { "delete" }
                    }
                }
            }
        }
    }
}

pub fn build_read_only_card_markup(card: &Card, ctx: &RenderContext<'_>) -> Markup {
    let (date, time) = card
        .due_date
        .map(|due| (ctx.display.format_date(due), ctx.display.format_time(due)))
        .unwrap_or_default();
    let class = card_class(
        card.color,
        false,
        card.is_repeating(),
        derived::is_expired(card.due_date, ctx.now),
    );

    html! {
        article class=(class) {
            div.card__form {
                div.card__inner {
                    div.card__control {
                        (action_button("edit", true))
                        (action_button("archive", card.is_archive))
                        (action_button("favorites", card.is_favorite))
                    }
                    (color_bar())
                    div.card__textarea-wrap {
                        p.card__text { (card.description) }
                    }
                    div.card__settings {
                        div.card__details {
                            div.card__dates {
                                div.card__date-deadline {
                                    p.card__input-deadline-wrap {
                                        span.card__date { (date) }
                                        span.card__time { (time) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn action_button(name: &str, is_active: bool) -> Markup {
    let mut class = format!("card__btn card__btn--{name}");
    if !is_active {
        class.push_str(" card__btn--disabled");
    }

    html! {
        button type="button" class=(class) { (name) }
    }
}

const COLOR_BAR_WAVE: &str =
    r##"<svg class="card__color-bar-wave" width="100%" height="10"><use xlink:href="#wave"></use></svg>"##;

fn color_bar() -> Markup {
    html! {
        div.card__color-bar { (PreEscaped(COLOR_BAR_WAVE)) }
    }
}

fn card_class(color: CardColor, is_edit: bool, is_repeating: bool, is_expired: bool) -> String {
    let mut classes = vec!["card".to_string()];
    if is_edit {
        classes.push("card--edit".to_string());
    }
    classes.push(format!("card--{}", color.as_str()));
    if is_repeating {
        classes.push("card--repeat".to_string());
    }
    if is_expired {
        classes.push("card--deadline".to_string());
    }
    classes.join(" ")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
