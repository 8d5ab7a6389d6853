use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kestrel=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    // `.env` is read by `Settings::from_env` once the subscriber is installed.
    init_tracing();
    dioxus::launch(kestrel::ui::App);
}
