use anyhow::anyhow;
use gloo::events::{
  EventListener,
  EventListenerOptions
};
use taskcard_core::dom::{
  Control,
  Dom,
  EventKind,
  InputChange,
  Listener
};
use wasm_bindgen::{
  JsCast,
  JsValue
};
use web_sys::{
  Document,
  Element,
  Event,
  HtmlInputElement
};

/// [`Dom`] backed by the page
/// document. Listeners are `gloo`
/// event listeners, detached on drop.
pub struct WebDom {
  document: Document
}

impl WebDom {
  pub fn new() -> anyhow::Result<Self> {
    let document = web_sys::window()
      .and_then(|window| {
        window.document()
      })
      .ok_or_else(|| {
        anyhow!(
          "no document available"
        )
      })?;
    Ok(Self {
      document
    })
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  pub fn element_by_id(
    &self,
    id: &str
  ) -> Option<Element> {
    self
      .document
      .get_element_by_id(id)
  }
}

fn js_error(
  context: &str,
  value: JsValue
) -> anyhow::Error {
  let detail = value
    .dyn_ref::<js_sys::Error>()
    .map(|error| {
      String::from(error.message())
    })
    .or_else(|| value.as_string())
    .unwrap_or_else(|| {
      format!("{value:?}")
    });
  anyhow!("{context}: {detail}")
}

/// Submit listeners must be able to
/// cancel the native form navigation,
/// so they are never passive.
fn listener_options(
  kind: EventKind
) -> EventListenerOptions {
  match kind {
    | EventKind::Submit => {
      EventListenerOptions::enable_prevent_default()
    }
    | EventKind::Click
    | EventKind::Change => {
      EventListenerOptions::default()
    }
  }
}

impl Dom for WebDom {
  type Event = Event;
  type Node = Element;
  type Subscription = EventListener;

  fn create_element(
    &self,
    markup: &str
  ) -> anyhow::Result<Element> {
    let holder = self
      .document
      .create_element("div")
      .map_err(|error| {
        js_error(
          "failed to create element",
          error
        )
      })?;
    holder.set_inner_html(
      markup.trim()
    );

    let element = holder
      .first_element_child()
      .ok_or_else(|| {
        anyhow!(
          "markup has no root element"
        )
      })?;
    element.remove();
    Ok(element)
  }

  fn append_child(
    &self,
    container: &Element,
    child: &Element
  ) -> anyhow::Result<()> {
    container
      .append_child(child)
      .map(|_| ())
      .map_err(|error| {
        js_error(
          "failed to append card",
          error
        )
      })
  }

  fn replace_node(
    &self,
    old: &Element,
    new: &Element
  ) -> anyhow::Result<()> {
    if old.parent_node().is_none() {
      return Ok(());
    }
    old
      .replace_with_with_node_1(new)
      .map_err(|error| {
        js_error(
          "failed to replace card",
          error
        )
      })
  }

  fn remove_node(
    &self,
    node: &Element
  ) -> anyhow::Result<()> {
    node.remove();
    Ok(())
  }

  fn release_node(
    &self,
    node: &Element
  ) -> anyhow::Result<()> {
    node.remove();
    Ok(())
  }

  fn listen(
    &self,
    node: &Element,
    control: Control,
    kind: EventKind,
    listener: Listener<Event>
  ) -> anyhow::Result<Option<EventListener>>
  {
    let target = node
      .query_selector(
        &control.selector()
      )
      .map_err(|error| {
        js_error(
          "invalid control selector",
          error
        )
      })?;

    Ok(target.map(|target| {
      EventListener::new_with_options(
        &target,
        kind.as_str(),
        listener_options(kind),
        move |event| listener(event)
      )
    }))
  }

  fn input_change(
    &self,
    event: &Event
  ) -> Option<InputChange> {
    let input = event
      .target()?
      .dyn_into::<HtmlInputElement>()
      .ok()?;
    Some(InputChange {
      value:   input.value(),
      checked: input.checked()
    })
  }
}
