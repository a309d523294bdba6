use std::cell::RefCell;
use std::rc::{
  Rc,
  Weak
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Duration,
  Utc
};
use gloo::events::EventListener;
use taskcard_core::card::{
  Card,
  CardColor,
  Weekday
};
use taskcard_core::card_edit::CardEdit;
use taskcard_core::card_view::CardView;
use taskcard_core::config::DisplayConfig;
use wasm_bindgen::JsCast;
use web_sys::{
  Element,
  Event,
  HtmlInputElement,
  HtmlTextAreaElement,
  KeyboardEvent
};

use crate::web_dom::WebDom;

const BOARD_ELEMENT_ID: &str = "board";
const CARDS_ELEMENT_ID: &str = "cards";

thread_local! {
  static BOARD: RefCell<Vec<SharedController>> =
    const { RefCell::new(Vec::new()) };
}

type SharedController =
  Rc<RefCell<CardController>>;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
enum Mode {
  View,
  Edit,
  Deleted
}

#[derive(Debug, Clone, Copy)]
enum Flag {
  Archive,
  Favorite
}

/// What the user typed into the
/// free-text fields of the edit form.
#[derive(Debug)]
struct Typed {
  description: Option<String>,
  deadline:    Option<String>
}

/// Owns the two components of one
/// card and swaps them in place.
struct CardController {
  dom:    Rc<WebDom>,
  card:   Card,
  mode:   Mode,
  view:   CardView<WebDom>,
  editor: CardEdit<WebDom>,
  escape: Option<EventListener>
}

/// Mounts every card found in the page
/// (or a few demo cards) into
/// `#board`.
#[tracing::instrument]
pub fn start() -> anyhow::Result<()> {
  let dom = Rc::new(WebDom::new()?);
  let container = dom
    .element_by_id(BOARD_ELEMENT_ID)
    .ok_or_else(|| {
      anyhow!(
        "missing #{BOARD_ELEMENT_ID} \
         mount element"
      )
    })?;

  let cards = page_cards(&dom)?
    .unwrap_or_else(demo_cards);
  tracing::info!(
    cards = cards.len(),
    "mounting cards"
  );

  let mut controllers =
    Vec::with_capacity(cards.len());
  for card in cards {
    controllers.push(mount_card(
      &dom, &container, card
    )?);
  }

  BOARD.with(|board| {
    board
      .borrow_mut()
      .extend(controllers)
  });
  Ok(())
}

fn page_cards(
  dom: &WebDom
) -> anyhow::Result<Option<Vec<Card>>> {
  let Some(raw) = dom
    .element_by_id(CARDS_ELEMENT_ID)
    .and_then(|element| {
      element.text_content()
    })
  else {
    return Ok(None);
  };

  let cards = serde_json::from_str(&raw)
    .with_context(|| {
      format!(
        "invalid card data in \
         #{CARDS_ELEMENT_ID}"
      )
    })?;
  Ok(Some(cards))
}

fn demo_cards() -> Vec<Card> {
  let now = Utc::now();

  let mut overdue = Card::new(
    "Renew library card",
    CardColor::Black
  );
  overdue.due_date =
    Some(now - Duration::days(1));
  overdue.is_favorite = true;

  let mut weekly = Card::new(
    "Water the plants",
    CardColor::Green
  );
  weekly
    .repeating_days
    .set(Weekday::Mo, true);
  weekly
    .repeating_days
    .set(Weekday::Th, true);

  let mut upcoming = Card::new(
    "Book dentist appointment",
    CardColor::Blue
  );
  upcoming.due_date =
    Some(now + Duration::days(3));
  upcoming.is_archive = true;

  vec![overdue, weekly, upcoming]
}

fn mount_card(
  dom: &Rc<WebDom>,
  container: &Element,
  card: Card
) -> anyhow::Result<SharedController> {
  let (view, editor) =
    build_components(dom, &card)?;
  view.mount(container)?;

  let shared =
    Rc::new(RefCell::new(CardController {
      dom: dom.clone(),
      card,
      mode: Mode::View,
      view,
      editor,
      escape: None
    }));
  bind(&shared)?;
  Ok(shared)
}

fn build_components(
  dom: &Rc<WebDom>,
  card: &Card
) -> anyhow::Result<(
  CardView<WebDom>,
  CardEdit<WebDom>
)> {
  let view =
    CardView::new(dom.clone(), card.clone())?;
  let editor =
    CardEdit::new(dom.clone(), card.clone())?;
  Ok((view, editor))
}

fn bind(
  shared: &SharedController
) -> anyhow::Result<()> {
  let weak = Rc::downgrade(shared);
  let mut this = shared.borrow_mut();

  this.view.register_edit_click_handler(
    action(&weak, |shared, _| {
      open_editor(shared)
    })
  )?;
  this
    .view
    .register_archive_click_handler(
      action(&weak, |shared, _| {
        toggle_flag(shared, Flag::Archive)
      })
    )?;
  this
    .view
    .register_favorites_click_handler(
      action(&weak, |shared, _| {
        toggle_flag(
          shared,
          Flag::Favorite
        )
      })
    )?;

  this.editor.register_submit_handler(
    action(&weak, |shared, event| {
      event.prevent_default();
      save(shared)
    })
  )?;
  this
    .editor
    .register_delete_click_handler(
      action(&weak, |shared, _| {
        delete(shared)
      })
    )?;
  Ok(())
}

fn action(
  weak: &Weak<RefCell<CardController>>,
  run: impl Fn(
    &SharedController,
    &Event
  ) -> anyhow::Result<()>
  + 'static
) -> impl Fn(&Event) + 'static {
  let weak = weak.clone();
  move |event: &Event| {
    let Some(shared) = weak.upgrade()
    else {
      return;
    };
    if let Err(error) =
      run(&shared, event)
    {
      tracing::error!(
        error = %format!("{error:#}"),
        "card action failed"
      );
    }
  }
}

fn open_editor(
  shared: &SharedController
) -> anyhow::Result<()> {
  let weak = Rc::downgrade(shared);
  let mut this = shared.borrow_mut();
  if this.mode != Mode::View {
    return Ok(());
  }

  this
    .editor
    .mount_replacing(&this.view.element())?;
  this.mode = Mode::Edit;

  let escape = EventListener::new(
    this.dom.document(),
    "keydown",
    move |event| {
      let is_escape = event
        .dyn_ref::<KeyboardEvent>()
        .is_some_and(|key| {
          matches!(
            key.key().as_str(),
            "Escape" | "Esc"
          )
        });
      if !is_escape {
        return;
      }
      if let Some(shared) = weak.upgrade()
        && let Err(error) =
          close_editor(&shared)
      {
        tracing::error!(
          error = %format!("{error:#}"),
          "failed to close card editor"
        );
      }
    }
  );
  this.escape = Some(escape);
  Ok(())
}

fn close_editor(
  shared: &SharedController
) -> anyhow::Result<()> {
  let mut this = shared.borrow_mut();
  if this.mode != Mode::Edit {
    return Ok(());
  }

  this.editor.reset()?;
  this
    .view
    .mount_replacing(&this.editor.element())?;
  this.editor.unmount()?;
  this.mode = Mode::View;
  this.escape = None;
  Ok(())
}

fn save(
  shared: &SharedController
) -> anyhow::Result<()> {
  let mut this = shared.borrow_mut();
  let card = saved_card(
    this.editor.draft(),
    typed_fields(&this.editor.element()),
    &DisplayConfig::default(),
    Utc::now()
  );
  tracing::info!(
    color = %card.color,
    repeating = card.is_repeating(),
    "saving card"
  );

  let (view, editor) =
    build_components(&this.dom, &card)?;
  view.mount_replacing(
    &this.editor.element()
  )?;
  this.editor.unmount()?;

  this.card = card;
  this.view = view;
  this.editor = editor;
  this.mode = Mode::View;
  this.escape = None;
  drop(this);

  bind(shared)
}

fn toggle_flag(
  shared: &SharedController,
  flag: Flag
) -> anyhow::Result<()> {
  let mut this = shared.borrow_mut();
  let card = toggled(&this.card, flag);
  tracing::debug!(?flag, "toggling card flag");

  let (view, editor) =
    build_components(&this.dom, &card)?;
  view.mount_replacing(
    &this.view.element()
  )?;

  this.card = card;
  this.view = view;
  this.editor = editor;
  drop(this);

  bind(shared)
}

fn delete(
  shared: &SharedController
) -> anyhow::Result<()> {
  let mut this = shared.borrow_mut();
  this.editor.unmount()?;
  this.view.unmount()?;
  this.mode = Mode::Deleted;
  this.escape = None;
  tracing::info!(
    description = %this.card.description,
    "card deleted"
  );
  Ok(())
}

/// Applies the typed fields to the
/// editor's draft. The due date can only
/// change while the draft keeps one: a
/// card without a date cannot be saved
/// with the date fieldset open. An
/// unreadable deadline keeps the old
/// date.
fn saved_card(
  mut draft: Card,
  typed: Typed,
  display: &DisplayConfig,
  now: DateTime<Utc>
) -> Card {
  if let Some(description) =
    typed.description
  {
    draft.description = description;
  }

  if draft.due_date.is_some() {
    let parsed = typed
      .deadline
      .as_deref()
      .and_then(|text| {
        display.parse_deadline(text, now)
      });
    match parsed {
      | Some(due) => {
        draft.due_date = Some(due)
      }
      | None => {
        if let Some(text) = typed.deadline
        {
          tracing::warn!(
            deadline = %text,
            "keeping due date, typed \
             deadline is unreadable"
          );
        }
      }
    }
  }
  draft
}

fn toggled(
  card: &Card,
  flag: Flag
) -> Card {
  let mut card = card.clone();
  match flag {
    | Flag::Archive => {
      card.is_archive = !card.is_archive
    }
    | Flag::Favorite => {
      card.is_favorite = !card.is_favorite
    }
  }
  card
}

fn typed_fields(form: &Element) -> Typed {
  let description = form
    .query_selector("textarea")
    .ok()
    .flatten()
    .and_then(|node| {
      node
        .dyn_into::<HtmlTextAreaElement>()
        .ok()
    })
    .map(|textarea| textarea.value());
  let deadline = form
    .query_selector(".card__date")
    .ok()
    .flatten()
    .and_then(|node| {
      node
        .dyn_into::<HtmlInputElement>()
        .ok()
    })
    .map(|input| input.value());

  Typed {
    description,
    deadline
  }
}
