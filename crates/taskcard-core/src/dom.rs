//! Seam between the card components and whatever owns the real nodes.
//!
//! The browser frontend implements [`Dom`] on top of `web-sys`;
//! [`memory::MemoryDom`] is a headless host for tests and native tools.

pub mod memory;

use std::rc::Rc;

/// Event callback. Two listeners are the same handler iff they are the
/// same `Rc`.
pub type Listener<E> = Rc<dyn Fn(&E)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    Change,
    Submit,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Change => "change",
            EventKind::Submit => "submit",
        }
    }
}

/// Every element a card component binds a listener to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    Form,
    DateToggle,
    RepeatToggle,
    RepeatDays,
    Colors,
    DeleteButton,
    EditButton,
    ArchiveButton,
    FavoritesButton,
}

impl Control {
    pub fn class_name(self) -> &'static str {
        match self {
            Control::Form => "card__form",
            Control::DateToggle => "card__date-deadline-toggle",
            Control::RepeatToggle => "card__repeat-toggle",
            Control::RepeatDays => "card__repeat-days",
            Control::Colors => "card__colors-inner",
            Control::DeleteButton => "card__delete",
            Control::EditButton => "card__btn--edit",
            Control::ArchiveButton => "card__btn--archive",
            Control::FavoritesButton => "card__btn--favorites",
        }
    }

    pub fn selector(self) -> String {
        format!(".{}", self.class_name())
    }
}

/// State of the input that fired a change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputChange {
    pub value: String,
    pub checked: bool,
}

pub trait Dom: 'static {
    type Node: Clone + 'static;
    type Event: 'static;
    /// Keeps a listener attached; dropping it detaches the listener.
    type Subscription: 'static;

    /// Builds a detached element from markup with a single root.
    fn create_element(&self, markup: &str) -> anyhow::Result<Self::Node>;

    fn append_child(&self, container: &Self::Node, child: &Self::Node) -> anyhow::Result<()>;

    /// Puts `new` where `old` sits in its parent. A detached `old` is not
    /// an error.
    fn replace_node(&self, old: &Self::Node, new: &Self::Node) -> anyhow::Result<()>;

    fn remove_node(&self, node: &Self::Node) -> anyhow::Result<()>;

    /// Detaches `node` for good and frees what the host keeps for it. The
    /// handle must not be mounted again.
    fn release_node(&self, node: &Self::Node) -> anyhow::Result<()>;

    /// Attaches `listener` to `control` inside `node`; `Ok(None)` when the
    /// control is not rendered.
    fn listen(
        &self,
        node: &Self::Node,
        control: Control,
        kind: EventKind,
        listener: Listener<Self::Event>,
    ) -> anyhow::Result<Option<Self::Subscription>>;

    fn input_change(&self, event: &Self::Event) -> Option<InputChange>;
}
