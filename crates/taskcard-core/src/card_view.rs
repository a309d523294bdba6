use std::rc::Rc;

use anyhow::anyhow;

use crate::card::Card;
use crate::config::RenderOptions;
use crate::dom::{Control, Dom, EventKind};
use crate::markup::{self, RenderContext};

/// Read-only card. Renders once; listeners stay on the node it was
/// built with.
pub struct CardView<D: Dom> {
    dom: Rc<D>,
    card: Card,
    options: RenderOptions,
    node: D::Node,
    subscriptions: Vec<D::Subscription>,
}

impl<D: Dom> CardView<D> {
    pub fn new(dom: Rc<D>, card: Card) -> anyhow::Result<Self> {
        Self::with_options(dom, card, RenderOptions::default())
    }

    pub fn with_options(dom: Rc<D>, card: Card, options: RenderOptions) -> anyhow::Result<Self> {
        let node = dom.create_element(&card_markup(&card, &options))?;
        Ok(Self {
            dom,
            card,
            options,
            node,
            subscriptions: Vec::new(),
        })
    }

    pub fn render(&self) -> String {
        card_markup(&self.card, &self.options)
    }

    pub fn element(&self) -> D::Node {
        self.node.clone()
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    pub fn mount(&self, container: &D::Node) -> anyhow::Result<()> {
        self.dom.append_child(container, &self.node)
    }

    /// Mounts in place of `other`, e.g. an editor being closed.
    pub fn mount_replacing(&self, other: &D::Node) -> anyhow::Result<()> {
        self.dom.replace_node(other, &self.node)
    }

    pub fn unmount(&mut self) -> anyhow::Result<()> {
        self.subscriptions.clear();
        self.dom.remove_node(&self.node)
    }

    pub fn register_edit_click_handler(&mut self, handler: impl Fn(&D::Event) + 'static) -> anyhow::Result<()> {
        self.bind_click(Control::EditButton, handler)
    }

    pub fn register_favorites_click_handler(
        &mut self,
        handler: impl Fn(&D::Event) + 'static,
    ) -> anyhow::Result<()> {
        self.bind_click(Control::FavoritesButton, handler)
    }

    pub fn register_archive_click_handler(
        &mut self,
        handler: impl Fn(&D::Event) + 'static,
    ) -> anyhow::Result<()> {
        self.bind_click(Control::ArchiveButton, handler)
    }

    fn bind_click(&mut self, control: Control, handler: impl Fn(&D::Event) + 'static) -> anyhow::Result<()> {
        let subscription = self
            .dom
            .listen(&self.node, control, EventKind::Click, Rc::new(handler))?
            .ok_or_else(|| anyhow!("read-only card has no {} control", control.selector()))?;
        self.subscriptions.push(subscription);
        Ok(())
    }
}

fn card_markup(card: &Card, options: &RenderOptions) -> String {
    let ctx = RenderContext {
        now: (options.clock)(),
        display: &options.display,
    };
    markup::build_read_only_card_markup(card, &ctx).into_string()
}
