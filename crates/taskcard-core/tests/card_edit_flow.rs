use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use taskcard_core::card::{COLORS, Card, CardColor, RepeatingDays, Weekday};
use taskcard_core::card_edit::CardEdit;
use taskcard_core::card_view::CardView;
use taskcard_core::config::{DisplayConfig, RenderOptions};
use taskcard_core::dom::memory::{MemoryDom, MemoryEvent};
use taskcard_core::dom::{Control, Dom, EventKind};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 17, 12, 0, 0)
        .single()
        .expect("valid now")
}

fn pinned_options() -> RenderOptions {
    RenderOptions {
        display: DisplayConfig::default(),
        clock: fixed_now,
    }
}

fn plain_card() -> Card {
    Card::new("Take out the trash", CardColor::Black)
}

fn mounted_editor(card: Card) -> (Rc<MemoryDom>, CardEdit<MemoryDom>) {
    let dom = Rc::new(MemoryDom::new());
    let container = dom.create_container();
    let editor = CardEdit::with_options(dom.clone(), card, pinned_options()).expect("editor");
    editor.mount(&container).expect("mount");
    (dom, editor)
}

#[test]
fn submit_handler_survives_date_toggle() {
    let (dom, editor) = mounted_editor(plain_card());
    let submits = Rc::new(Cell::new(0));

    let counter = submits.clone();
    editor
        .register_submit_handler(move |_| counter.set(counter.get() + 1))
        .expect("register submit");

    let before = editor.element();
    assert_eq!(dom.click(before, Control::DateToggle), 1);

    let after = editor.element();
    assert_ne!(before, after);
    assert!(editor.state().is_date_showing);

    assert_eq!(dom.submit(before), 0);
    assert_eq!(dom.submit(after), 1);
    assert_eq!(submits.get(), 1);
}

#[test]
fn submit_handler_survives_every_transition_kind() {
    let (dom, editor) = mounted_editor(plain_card());
    let submits = Rc::new(Cell::new(0));

    let counter = submits.clone();
    editor
        .register_submit_handler(move |_| counter.set(counter.get() + 1))
        .expect("register submit");

    dom.click(editor.element(), Control::RepeatToggle);
    dom.change(editor.element(), Control::RepeatDays, "fr", true);
    dom.change(editor.element(), Control::Colors, "green", true);
    dom.click(editor.element(), Control::DateToggle);
    editor.reset().expect("reset");

    assert_eq!(dom.submit(editor.element()), 1);
    assert_eq!(dom.listener_count(editor.element(), Control::Form, EventKind::Submit), 1);
    assert_eq!(submits.get(), 1);
}

#[test]
fn rerender_swaps_node_in_same_container() {
    let dom = Rc::new(MemoryDom::new());
    let container = dom.create_container();
    let neighbour = dom.create_element("<p class=\"neighbour\"></p>").expect("neighbour");
    let editor = CardEdit::with_options(dom.clone(), plain_card(), pinned_options()).expect("editor");

    editor.mount(&container).expect("mount");
    dom.append_child(&container, &neighbour).expect("append");

    editor.toggle_repeat().expect("toggle repeat");
    assert_eq!(dom.children(container), vec![editor.element(), neighbour]);
    assert!(dom.markup(editor.element()).contains("card__repeat-days"));
}

#[test]
fn reset_restores_original_state() {
    let (dom, editor) = mounted_editor(plain_card());

    dom.change(editor.element(), Control::Colors, "pink", true);
    dom.click(editor.element(), Control::RepeatToggle);
    dom.change(editor.element(), Control::RepeatDays, "mo", true);
    dom.change(editor.element(), Control::RepeatDays, "th", true);

    let edited = editor.state();
    assert_eq!(edited.color, CardColor::Pink);
    assert!(edited.is_repeating_card);
    assert!(edited.active_repeating_days.is_active(Weekday::Mo));
    assert!(edited.active_repeating_days.is_active(Weekday::Th));

    editor.reset().expect("reset");

    let state = editor.state();
    assert_eq!(state.color, CardColor::Black);
    assert!(!state.is_date_showing);
    assert!(!state.is_repeating_card);
    assert_eq!(state.active_repeating_days, RepeatingDays::none());
    assert!(!dom.markup(editor.element()).contains("card__repeat-days\""));
}

#[test]
fn edits_never_reach_the_bound_card() {
    let card = plain_card();
    let (_dom, editor) = mounted_editor(card.clone());

    editor.toggle_repeat().expect("toggle repeat");
    editor.toggle_day(Weekday::Sa).expect("toggle day");
    editor.select_color(CardColor::Blue).expect("select color");

    assert_eq!(editor.card(), card);
    assert!(!editor.card().repeating_days.is_active(Weekday::Sa));

    let draft = editor.draft();
    assert!(draft.repeating_days.is_active(Weekday::Sa));
    assert_eq!(draft.color, CardColor::Blue);
}

#[test]
fn render_is_idempotent_between_transitions() {
    let mut card = plain_card();
    card.due_date = Some(fixed_now() + Duration::days(2));
    let (dom, editor) = mounted_editor(card);

    assert_eq!(editor.render(), editor.render());
    assert_eq!(editor.render(), dom.markup(editor.element()));

    editor.toggle_date().expect("hide date");
    assert_eq!(editor.render(), editor.render());
    assert_eq!(editor.render(), dom.markup(editor.element()));
}

#[test]
fn save_button_tracks_state() {
    let (dom, editor) = mounted_editor(plain_card());
    assert!(!dom.markup(editor.element()).contains("disabled"));

    dom.click(editor.element(), Control::RepeatToggle);
    assert!(dom.markup(editor.element()).contains("type=\"submit\" disabled"));

    dom.change(editor.element(), Control::RepeatDays, "we", true);
    assert!(!dom.markup(editor.element()).contains("disabled"));

    dom.click(editor.element(), Control::DateToggle);
    assert!(dom.markup(editor.element()).contains("type=\"submit\" disabled"));
}

#[test]
fn unknown_change_values_are_ignored() {
    let (dom, editor) = mounted_editor(plain_card());
    let before = editor.element();

    dom.change(before, Control::Colors, "purple", true);
    assert_eq!(editor.element(), before);
    assert_eq!(editor.state().color, CardColor::Black);

    for color in COLORS {
        dom.change(editor.element(), Control::Colors, color.as_str(), true);
        assert_eq!(editor.state().color, color);
    }
}

#[test]
fn delete_handler_is_rebound_after_rerender() {
    let (dom, editor) = mounted_editor(plain_card());
    let deleted = Rc::new(Cell::new(false));

    let flag = deleted.clone();
    editor
        .register_delete_click_handler(move |_| flag.set(true))
        .expect("register delete");
    editor.select_color(CardColor::Yellow).expect("select color");

    assert_eq!(dom.click(editor.element(), Control::DeleteButton), 1);
    assert!(deleted.get());
}

#[test]
fn submit_handler_may_reset_the_editor() {
    let dom = Rc::new(MemoryDom::new());
    let container = dom.create_container();
    let editor = CardEdit::with_options(dom.clone(), plain_card(), pinned_options()).expect("editor");
    editor.mount(&container).expect("mount");

    let handle = editor.clone();
    editor
        .register_submit_handler(move |_| handle.reset().expect("reset inside handler"))
        .expect("register submit");

    editor.toggle_repeat().expect("toggle repeat");
    assert_eq!(dom.submit(editor.element()), 1);
    assert!(!editor.state().is_repeating_card);
    assert_eq!(dom.children(container), vec![editor.element()]);
}

#[test]
fn unmount_detaches_node_and_listeners() {
    let dom = Rc::new(MemoryDom::new());
    let container = dom.create_container();
    let editor = CardEdit::with_options(dom.clone(), plain_card(), pinned_options()).expect("editor");
    editor.mount(&container).expect("mount");
    editor.register_submit_handler(|_| {}).expect("register submit");

    editor.unmount().expect("unmount");
    assert!(!editor.is_mounted());
    assert!(dom.children(container).is_empty());
    assert_eq!(dom.submit(editor.element()), 0);

    editor.mount(&container).expect("mount again");
    assert_eq!(dom.submit(editor.element()), 1);
}

#[test]
fn read_only_card_exposes_three_click_events() {
    let dom = Rc::new(MemoryDom::new());
    let container = dom.create_container();
    let mut card = plain_card();
    card.due_date = Some(fixed_now() - Duration::days(1));

    let mut view = CardView::with_options(dom.clone(), card, pinned_options()).expect("view");
    view.mount(&container).expect("mount");

    let clicks = Rc::new(RefCell::new(Vec::new()));
    for (name, control) in [
        ("edit", Control::EditButton),
        ("archive", Control::ArchiveButton),
        ("favorites", Control::FavoritesButton),
    ] {
        let log = clicks.clone();
        let handler = move |_: &MemoryEvent| log.borrow_mut().push(name);
        let registered = match control {
            Control::EditButton => view.register_edit_click_handler(handler),
            Control::ArchiveButton => view.register_archive_click_handler(handler),
            _ => view.register_favorites_click_handler(handler),
        };
        registered.expect("register click");
    }

    dom.click(view.element(), Control::FavoritesButton);
    dom.click(view.element(), Control::EditButton);
    dom.click(view.element(), Control::ArchiveButton);
    assert_eq!(*clicks.borrow(), vec!["favorites", "edit", "archive"]);

    let markup = dom.markup(view.element());
    assert!(markup.contains("card--deadline"));
    assert_eq!(markup, view.render());
}

#[test]
fn editor_replaces_view_in_place() {
    let dom = Rc::new(MemoryDom::new());
    let container = dom.create_container();
    let view = CardView::with_options(dom.clone(), plain_card(), pinned_options()).expect("view");
    view.mount(&container).expect("mount view");

    let editor = CardEdit::with_options(dom.clone(), view.card().clone(), pinned_options()).expect("editor");
    editor.mount_replacing(&view.element()).expect("swap in editor");
    assert_eq!(dom.children(container), vec![editor.element()]);

    editor.unmount().expect("unmount editor");
    view.mount(&container).expect("remount view");
    assert_eq!(dom.children(container), vec![view.element()]);
}
