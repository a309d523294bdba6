use crate::card::{Card, CardColor, RepeatingDays, Weekday};
use crate::derived;

/// Unsaved edits held by one open edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub color: CardColor,
    pub is_date_showing: bool,
    pub is_repeating_card: bool,
    pub active_repeating_days: RepeatingDays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ToggleDate,
    ToggleRepeat,
    ToggleDay(Weekday),
    SelectColor(CardColor),
}

impl EditState {
    pub fn from_card(card: &Card) -> Self {
        Self {
            color: card.color,
            is_date_showing: card.due_date.is_some(),
            is_repeating_card: card.is_repeating(),
            active_repeating_days: card.repeating_days.clone(),
        }
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::ToggleDate => self.is_date_showing = !self.is_date_showing,
            Transition::ToggleRepeat => self.is_repeating_card = !self.is_repeating_card,
            Transition::ToggleDay(day) => self.active_repeating_days.toggle(day),
            Transition::SelectColor(color) => self.color = color,
        }
    }

    pub fn is_save_blocked(&self, card: &Card) -> bool {
        derived::is_save_blocked(
            self.is_date_showing,
            card.due_date,
            self.is_repeating_card,
            &self.active_repeating_days,
        )
    }

    /// New card with these edits applied on top of `card`.
    ///
    /// A hidden date fieldset drops the due date and a disabled repeat mode
    /// clears every day.
    pub fn draft(&self, card: &Card) -> Card {
        let repeating_days = if self.is_repeating_card {
            self.active_repeating_days.clone()
        } else {
            RepeatingDays::none()
        };

        Card {
            description: card.description.clone(),
            due_date: card.due_date.filter(|_| self.is_date_showing),
            repeating_days,
            color: self.color,
            is_archive: card.is_archive,
            is_favorite: card.is_favorite,
        }
    }
}
