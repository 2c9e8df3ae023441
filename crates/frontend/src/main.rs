mod app;

use app::App;
use tracing_subscriber::fmt::format::Pretty;
use tracing_subscriber::prelude::*;
use tracing_web::{MakeWebConsoleWriter, performance_layer};

fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_writer(MakeWebConsoleWriter::new());
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());

    let subscriber = tracing_subscriber::registry().with(fmt_layer).with(perf_layer);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return;
    }
    // `log` records from dependencies
    wasm_logger::init(wasm_logger::Config::default());
}

fn main() {
    init_tracing();
    yew::Renderer::<App>::new().render();
}
