use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use tracing::trace;

use super::{Control, Dom, EventKind, InputChange, Listener};

static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="([^"]*)""#).expect("class attribute pattern"));

/// Handle to a node. Slots are reused once a node is released, so a handle
/// also carries the generation of the slot it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryNode {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
    pub kind: EventKind,
    pub input: Option<InputChange>,
}

impl MemoryEvent {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, input: None }
    }
}

struct Bound {
    id: u64,
    control: Control,
    kind: EventKind,
    listener: Listener<MemoryEvent>,
}

#[derive(Default)]
struct NodeRecord {
    generation: u32,
    released: bool,
    markup: String,
    parent: Option<usize>,
    children: Vec<usize>,
    listeners: Vec<Bound>,
}

#[derive(Default)]
struct Tree {
    nodes: Vec<NodeRecord>,
    free: Vec<usize>,
    next_listener: u64,
}

impl Tree {
    fn live(&self, node: MemoryNode) -> Option<&NodeRecord> {
        self.nodes
            .get(node.index)
            .filter(|record| !record.released && record.generation == node.generation)
    }

    fn record(&self, node: MemoryNode) -> anyhow::Result<&NodeRecord> {
        self.live(node)
            .ok_or_else(|| anyhow!("unknown node #{}", node.index))
    }

    fn record_mut(&mut self, node: MemoryNode) -> anyhow::Result<&mut NodeRecord> {
        self.nodes
            .get_mut(node.index)
            .filter(|record| !record.released && record.generation == node.generation)
            .ok_or_else(|| anyhow!("unknown node #{}", node.index))
    }

    fn handle(&self, index: usize) -> MemoryNode {
        MemoryNode {
            index,
            generation: self.nodes[index].generation,
        }
    }

    fn insert(&mut self, markup: String) -> MemoryNode {
        let index = match self.free.pop() {
            Some(index) => {
                let record = &mut self.nodes[index];
                record.released = false;
                record.markup = markup;
                index
            }
            None => {
                self.nodes.push(NodeRecord {
                    markup,
                    ..NodeRecord::default()
                });
                self.nodes.len() - 1
            }
        };
        self.handle(index)
    }

    fn detach(&mut self, node: MemoryNode) -> anyhow::Result<()> {
        let parent = self.record_mut(node)?.parent.take();
        if let Some(parent) = parent {
            self.nodes[parent].children.retain(|child| *child != node.index);
        }
        Ok(())
    }

    fn release(&mut self, node: MemoryNode) -> anyhow::Result<()> {
        self.detach(node)?;
        let record = &mut self.nodes[node.index];
        let children = std::mem::take(&mut record.children);
        record.released = true;
        record.generation = record.generation.wrapping_add(1);
        record.markup = String::new();
        record.listeners = Vec::new();
        for child in children {
            self.nodes[child].parent = None;
        }
        self.free.push(node.index);
        Ok(())
    }
}

/// Headless [`Dom`]: nodes are markup strings, controls are found by class
/// name and events are fired by hand.
#[derive(Clone, Default)]
pub struct MemoryDom {
    tree: Rc<RefCell<Tree>>,
}

pub struct MemorySubscription {
    tree: Weak<RefCell<Tree>>,
    node: MemoryNode,
    id: u64,
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        let Some(shared) = self.tree.upgrade() else {
            return;
        };
        let mut tree = shared.borrow_mut();
        if let Ok(record) = tree.record_mut(self.node) {
            record.listeners.retain(|bound| bound.id != self.id);
        }
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty node to mount components into.
    pub fn create_container(&self) -> MemoryNode {
        self.tree.borrow_mut().insert(String::new())
    }

    /// Nodes created and not yet released.
    pub fn live_nodes(&self) -> usize {
        let tree = self.tree.borrow();
        tree.nodes.len() - tree.free.len()
    }

    pub fn children(&self, node: MemoryNode) -> Vec<MemoryNode> {
        let tree = self.tree.borrow();
        tree.live(node)
            .map(|record| record.children.iter().map(|child| tree.handle(*child)).collect())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: MemoryNode) -> Option<MemoryNode> {
        let tree = self.tree.borrow();
        tree.live(node)
            .and_then(|record| record.parent)
            .map(|parent| tree.handle(parent))
    }

    pub fn markup(&self, node: MemoryNode) -> String {
        self.tree
            .borrow()
            .live(node)
            .map(|record| record.markup.clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, node: MemoryNode, control: Control, kind: EventKind) -> usize {
        self.tree
            .borrow()
            .live(node)
            .map(|record| {
                record
                    .listeners
                    .iter()
                    .filter(|bound| bound.control == control && bound.kind == kind)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Fires `event` at `control` inside `node` and returns how many
    /// listeners ran.
    pub fn dispatch(&self, node: MemoryNode, control: Control, event: &MemoryEvent) -> usize {
        let listeners: Vec<Listener<MemoryEvent>> = self
            .tree
            .borrow()
            .live(node)
            .map(|record| {
                record
                    .listeners
                    .iter()
                    .filter(|bound| bound.control == control && bound.kind == event.kind)
                    .map(|bound| bound.listener.clone())
                    .collect()
            })
            .unwrap_or_default();

        trace!(
            node = node.index,
            ?control,
            kind = event.kind.as_str(),
            listeners = listeners.len(),
            "dispatching event"
        );
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn click(&self, node: MemoryNode, control: Control) -> usize {
        self.dispatch(node, control, &MemoryEvent::new(EventKind::Click))
    }

    pub fn submit(&self, node: MemoryNode) -> usize {
        self.dispatch(node, Control::Form, &MemoryEvent::new(EventKind::Submit))
    }

    pub fn change(&self, node: MemoryNode, control: Control, value: &str, checked: bool) -> usize {
        let event = MemoryEvent {
            kind: EventKind::Change,
            input: Some(InputChange {
                value: value.to_string(),
                checked,
            }),
        };
        self.dispatch(node, control, &event)
    }
}

fn has_class(markup: &str, class_name: &str) -> bool {
    CLASS_ATTR.captures_iter(markup).any(|caps| {
        caps.get(1)
            .is_some_and(|classes| classes.as_str().split_whitespace().any(|c| c == class_name))
    })
}

impl Dom for MemoryDom {
    type Node = MemoryNode;
    type Event = MemoryEvent;
    type Subscription = MemorySubscription;

    fn create_element(&self, markup: &str) -> anyhow::Result<MemoryNode> {
        let markup = markup.trim();
        if !markup.starts_with('<') {
            return Err(anyhow!("markup has no root element"));
        }

        Ok(self.tree.borrow_mut().insert(markup.to_string()))
    }

    fn append_child(&self, container: &MemoryNode, child: &MemoryNode) -> anyhow::Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.record(*container)?;
        tree.detach(*child)?;
        tree.record_mut(*child)?.parent = Some(container.index);
        tree.record_mut(*container)?.children.push(child.index);
        Ok(())
    }

    fn replace_node(&self, old: &MemoryNode, new: &MemoryNode) -> anyhow::Result<()> {
        let mut tree = self.tree.borrow_mut();
        tree.record(*new)?;
        let Some(parent) = tree.record(*old)?.parent else {
            return Ok(());
        };

        tree.detach(*new)?;
        let siblings = &mut tree.nodes[parent].children;
        if let Some(slot) = siblings.iter_mut().find(|child| **child == old.index) {
            *slot = new.index;
        }
        tree.record_mut(*old)?.parent = None;
        tree.record_mut(*new)?.parent = Some(parent);
        Ok(())
    }

    fn remove_node(&self, node: &MemoryNode) -> anyhow::Result<()> {
        self.tree.borrow_mut().detach(*node)
    }

    fn release_node(&self, node: &MemoryNode) -> anyhow::Result<()> {
        trace!(node = node.index, "releasing node");
        self.tree.borrow_mut().release(*node)
    }

    fn listen(
        &self,
        node: &MemoryNode,
        control: Control,
        kind: EventKind,
        listener: Listener<MemoryEvent>,
    ) -> anyhow::Result<Option<MemorySubscription>> {
        let mut tree = self.tree.borrow_mut();
        if !has_class(&tree.record(*node)?.markup, control.class_name()) {
            return Ok(None);
        }

        tree.next_listener += 1;
        let id = tree.next_listener;
        tree.record_mut(*node)?.listeners.push(Bound {
            id,
            control,
            kind,
            listener,
        });

        Ok(Some(MemorySubscription {
            tree: Rc::downgrade(&self.tree),
            node: *node,
            id,
        }))
    }

    fn input_change(&self, event: &MemoryEvent) -> Option<InputChange> {
        event.input.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn matches_whole_class_tokens_only() {
        let markup = r#"<div class="card__date-deadline-toggle x"></div>"#;
        assert!(has_class(markup, "card__date-deadline-toggle"));
        assert!(!has_class(markup, "card__date-deadline"));
    }

    #[test]
    fn absent_control_is_not_bound() {
        let dom = MemoryDom::new();
        let node = dom.create_element(r#"<form class="card__form"></form>"#).expect("node");
        let bound = dom
            .listen(&node, Control::RepeatDays, EventKind::Change, Rc::new(|_: &MemoryEvent| {}))
            .expect("listen");
        assert!(bound.is_none());
    }

    #[test]
    fn dropping_subscription_detaches_listener() {
        let dom = MemoryDom::new();
        let node = dom.create_element(r#"<form class="card__form"></form>"#).expect("node");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let subscription = dom
            .listen(
                &node,
                Control::Form,
                EventKind::Submit,
                Rc::new(move |_: &MemoryEvent| counter.set(counter.get() + 1)),
            )
            .expect("listen")
            .expect("form present");

        assert_eq!(dom.submit(node), 1);
        drop(subscription);
        assert_eq!(dom.submit(node), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn replace_keeps_position_in_parent() {
        let dom = MemoryDom::new();
        let container = dom.create_container();
        let first = dom.create_element("<p class=\"a\"></p>").expect("first");
        let second = dom.create_element("<p class=\"b\"></p>").expect("second");
        let swapped = dom.create_element("<p class=\"c\"></p>").expect("swapped");
        dom.append_child(&container, &first).expect("append first");
        dom.append_child(&container, &second).expect("append second");

        dom.replace_node(&first, &swapped).expect("replace");
        assert_eq!(dom.children(container), vec![swapped, second]);
        assert_eq!(dom.parent(first), None);
        assert_eq!(dom.parent(swapped), Some(container));
    }

    #[test]
    fn released_slot_is_reused_without_reviving_old_handle() {
        let dom = MemoryDom::new();
        let container = dom.create_container();
        let old = dom.create_element(r#"<form class="card__form"></form>"#).expect("old");
        dom.append_child(&container, &old).expect("append");
        let subscription = dom
            .listen(&old, Control::Form, EventKind::Submit, Rc::new(|_: &MemoryEvent| {}))
            .expect("listen")
            .expect("form present");

        dom.release_node(&old).expect("release");
        assert_eq!(dom.live_nodes(), 1);
        assert!(dom.children(container).is_empty());

        let fresh = dom.create_element(r#"<form class="card__form"></form>"#).expect("fresh");
        assert_ne!(fresh, old);
        assert_eq!(dom.live_nodes(), 2);
        assert_eq!(dom.markup(old), "");
        assert_eq!(dom.submit(old), 0);
        assert!(dom.append_child(&container, &old).is_err());

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let _bound = dom
            .listen(
                &fresh,
                Control::Form,
                EventKind::Submit,
                Rc::new(move |_: &MemoryEvent| counter.set(counter.get() + 1)),
            )
            .expect("listen fresh");
        drop(subscription);
        assert_eq!(dom.submit(fresh), 1);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn rejects_text_without_root() {
        let dom = MemoryDom::new();
        assert!(dom.create_element("just text").is_err());
    }
}
