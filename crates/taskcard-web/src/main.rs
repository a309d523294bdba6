mod board;
mod web_dom;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting taskcard frontend"
  );

  if let Err(error) = board::start() {
    tracing::error!(
      error = %format!("{error:#}"),
      "failed to start card board"
    );
  }
}
