//! Editable card: transient edit state plus the rerender cycle.
//!
//! Every transition rebuilds the markup from the next state, binds the
//! internal transition listeners and every handler in the registry to a new
//! node, and swaps that node in for the mounted one. A handler registered
//! once keeps firing across any number of rerenders. Nothing is committed
//! until the swap succeeds: on error the component keeps its previous
//! state, node and listeners.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::mem;
use std::rc::Rc;

use anyhow::bail;
use tracing::{debug, error, warn};

use crate::card::{Card, CardColor, Weekday};
use crate::config::RenderOptions;
use crate::dom::{Control, Dom, EventKind, Listener};
use crate::markup::{self, RenderContext};
use crate::state::{EditState, Transition};

/// Externally supplied handlers, one per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerSlot {
    Submit,
    Delete,
}

impl HandlerSlot {
    fn control(self) -> Control {
        match self {
            HandlerSlot::Submit => Control::Form,
            HandlerSlot::Delete => Control::DeleteButton,
        }
    }

    fn event(self) -> EventKind {
        match self {
            HandlerSlot::Submit => EventKind::Submit,
            HandlerSlot::Delete => EventKind::Click,
        }
    }
}

struct Inner<D: Dom> {
    dom: Rc<D>,
    card: Card,
    state: EditState,
    options: RenderOptions,
    node: D::Node,
    mounted: bool,
    subscriptions: Vec<D::Subscription>,
    handlers: BTreeMap<HandlerSlot, Listener<D::Event>>,
}


pub struct CardEdit<D: Dom> {
    inner: Rc<RefCell<Inner<D>>>,
}

impl<D: Dom> Clone for CardEdit<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: Dom> CardEdit<D> {
    pub fn new(dom: Rc<D>, card: Card) -> anyhow::Result<Self> {
        Self::with_options(dom, card, RenderOptions::default())
    }

    #[tracing::instrument(skip_all, fields(color = %card.color))]
    pub fn with_options(dom: Rc<D>, card: Card, options: RenderOptions) -> anyhow::Result<Self> {
        let state = EditState::from_card(&card);
        let node = dom.create_element(&edit_markup(&card, &state, &options))?;

        let inner = Rc::new(RefCell::new(Inner {
            dom,
            card,
            state,
            options,
            node,
            mounted: false,
            subscriptions: Vec::new(),
            handlers: BTreeMap::new(),
        }));
        remount(&inner)?;

        Ok(Self { inner })
    }

    /// Markup for the current transient state.
    pub fn render(&self) -> String {
        let inner = self.inner.borrow();
        edit_markup(&inner.card, &inner.state, &inner.options)
    }

    pub fn element(&self) -> D::Node {
        self.inner.borrow().node.clone()
    }

    pub fn state(&self) -> EditState {
        self.inner.borrow().state.clone()
    }

    /// The card this editor was built from; edits never reach it.
    pub fn card(&self) -> Card {
        self.inner.borrow().card.clone()
    }

    /// New card carrying the unsaved edits.
    pub fn draft(&self) -> Card {
        let inner = self.inner.borrow();
        inner.state.draft(&inner.card)
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().mounted
    }

    pub fn mount(&self, container: &D::Node) -> anyhow::Result<()> {
        let (dom, node) = self.attach_target()?;
        dom.append_child(container, &node)?;
        self.inner.borrow_mut().mounted = true;
        remount(&self.inner)
    }

    /// Mounts in place of `other`, e.g. the read-only card being edited.
    pub fn mount_replacing(&self, other: &D::Node) -> anyhow::Result<()> {
        let (dom, node) = self.attach_target()?;
        dom.replace_node(other, &node)?;
        self.inner.borrow_mut().mounted = true;
        remount(&self.inner)
    }

    /// Detaches the node and every listener. Registered handlers are kept
    /// for the next mount.
    pub fn unmount(&self) -> anyhow::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.dom.remove_node(&inner.node)?;
        inner.subscriptions.clear();
        inner.mounted = false;
        Ok(())
    }

    pub fn apply(&self, transition: Transition) -> anyhow::Result<()> {
        transition_and_rerender(&self.inner, transition)
    }

    pub fn toggle_date(&self) -> anyhow::Result<()> {
        self.apply(Transition::ToggleDate)
    }

    pub fn toggle_repeat(&self) -> anyhow::Result<()> {
        self.apply(Transition::ToggleRepeat)
    }

    pub fn toggle_day(&self, day: Weekday) -> anyhow::Result<()> {
        self.apply(Transition::ToggleDay(day))
    }

    pub fn select_color(&self, color: CardColor) -> anyhow::Result<()> {
        self.apply(Transition::SelectColor(color))
    }

    pub fn rerender(&self) -> anyhow::Result<()> {
        let state = self.state();
        rerender(&self.inner, state)
    }

    /// Drops unsaved edits and reloads the state from the bound card.
    #[tracing::instrument(skip(self))]
    pub fn reset(&self) -> anyhow::Result<()> {
        let state = EditState::from_card(&self.inner.borrow().card);
        rerender(&self.inner, state)?;
        debug!("card editor reset");
        Ok(())
    }

    pub fn register_submit_handler(&self, handler: impl Fn(&D::Event) + 'static) -> anyhow::Result<()> {
        self.register(HandlerSlot::Submit, Rc::new(handler))
    }

    pub fn register_delete_click_handler(
        &self,
        handler: impl Fn(&D::Event) + 'static,
    ) -> anyhow::Result<()> {
        self.register(HandlerSlot::Delete, Rc::new(handler))
    }

    /// Stores `handler` for `slot`, replacing any earlier one, and binds it
    /// to the current node.
    pub fn register(&self, slot: HandlerSlot, handler: Listener<D::Event>) -> anyhow::Result<()> {
        let previous = self.inner.borrow_mut().handlers.insert(slot, handler);
        if let Err(error) = remount(&self.inner) {
            let mut inner = self.inner.borrow_mut();
            match previous {
                Some(previous) => inner.handlers.insert(slot, previous),
                None => inner.handlers.remove(&slot),
            };
            return Err(error);
        }
        debug!(?slot, replaced = previous.is_some(), "registered card editor handler");
        Ok(())
    }

    fn attach_target(&self) -> anyhow::Result<(Rc<D>, D::Node)> {
        let inner = self.inner.borrow();
        if inner.mounted {
            bail!("card editor is already mounted");
        }
        Ok((inner.dom.clone(), inner.node.clone()))
    }
}

fn edit_markup(card: &Card, state: &EditState, options: &RenderOptions) -> String {
    let ctx = RenderContext {
        now: (options.clock)(),
        display: &options.display,
    };
    markup::build_edit_form_markup(card, state, &ctx).into_string()
}

fn transition_and_rerender<D: Dom>(
    inner: &Rc<RefCell<Inner<D>>>,
    transition: Transition,
) -> anyhow::Result<()> {
    let mut state = inner.borrow().state.clone();
    state.apply(transition);
    rerender(inner, state)?;
    debug!(?transition, "card editor transition");
    Ok(())
}

/// Renders `state` into a new node and swaps it in for the mounted one.
fn rerender<D: Dom>(inner: &Rc<RefCell<Inner<D>>>, state: EditState) -> anyhow::Result<()> {
    let (dom, markup, old) = {
        let inner = inner.borrow();
        (
            inner.dom.clone(),
            edit_markup(&inner.card, &state, &inner.options),
            inner.node.clone(),
        )
    };

    let node = dom.create_element(&markup)?;
    let subscriptions = match bind(inner, &node) {
        Ok(subscriptions) => subscriptions,
        Err(error) => {
            discard(&*dom, &node);
            return Err(error);
        }
    };
    if let Err(error) = dom.replace_node(&old, &node) {
        drop(subscriptions);
        discard(&*dom, &node);
        return Err(error);
    }

    let stale = {
        let mut inner = inner.borrow_mut();
        inner.state = state;
        inner.node = node;
        mem::replace(&mut inner.subscriptions, subscriptions)
    };
    drop(stale);
    discard(&*dom, &old);
    Ok(())
}

/// Rebinds every listener to the current node.
fn remount<D: Dom>(inner: &Rc<RefCell<Inner<D>>>) -> anyhow::Result<()> {
    let node = inner.borrow().node.clone();
    let subscriptions = bind(inner, &node)?;
    let stale = mem::replace(&mut inner.borrow_mut().subscriptions, subscriptions);
    drop(stale);
    Ok(())
}

/// Attaches the transition listeners and every registered handler to
/// `node`. Nothing is kept if one of them fails.
fn bind<D: Dom>(
    inner: &Rc<RefCell<Inner<D>>>,
    node: &D::Node,
) -> anyhow::Result<Vec<D::Subscription>> {
    let (dom, handlers) = {
        let inner = inner.borrow();
        (inner.dom.clone(), inner.handlers.clone())
    };

    let mut subscriptions = Vec::new();
    for (control, kind, listener) in transition_listeners(inner) {
        subscriptions.extend(dom.listen(node, control, kind, listener)?);
    }
    for (slot, handler) in handlers {
        subscriptions.extend(dom.listen(node, slot.control(), slot.event(), handler)?);
    }
    Ok(subscriptions)
}

fn discard<D: Dom>(dom: &D, node: &D::Node) {
    if let Err(error) = dom.release_node(node) {
        warn!(%error, "failed to release card editor node");
    }
}

fn transition_listeners<D: Dom>(
    inner: &Rc<RefCell<Inner<D>>>,
) -> Vec<(Control, EventKind, Listener<D::Event>)> {
    vec![
        (
            Control::DateToggle,
            EventKind::Click,
            on_event(inner, |_, _| Some(Transition::ToggleDate)),
        ),
        (
            Control::RepeatToggle,
            EventKind::Click,
            on_event(inner, |_, _| Some(Transition::ToggleRepeat)),
        ),
        (
            Control::RepeatDays,
            EventKind::Change,
            on_event(inner, |dom: &D, event| {
                let change = dom.input_change(event)?;
                match change.value.parse::<Weekday>() {
                    Ok(day) => Some(Transition::ToggleDay(day)),
                    Err(error) => {
                        warn!(%error, "ignoring repeat day change");
                        None
                    }
                }
            }),
        ),
        (
            Control::Colors,
            EventKind::Change,
            on_event(inner, |dom: &D, event| {
                let change = dom.input_change(event)?;
                match change.value.parse::<CardColor>() {
                    Ok(color) => Some(Transition::SelectColor(color)),
                    Err(error) => {
                        warn!(%error, "ignoring color change");
                        None
                    }
                }
            }),
        ),
    ]
}

fn on_event<D, F>(inner: &Rc<RefCell<Inner<D>>>, to_transition: F) -> Listener<D::Event>
where
    D: Dom,
    F: Fn(&D, &D::Event) -> Option<Transition> + 'static,
{
    let weak = Rc::downgrade(inner);
    Rc::new(move |event: &D::Event| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let dom = inner.borrow().dom.clone();
        let Some(transition) = to_transition(&dom, event) else {
            return;
        };
        if let Err(error) = transition_and_rerender(&inner, transition) {
            error!(%error, ?transition, "card editor rerender failed");
        }
    })
}
