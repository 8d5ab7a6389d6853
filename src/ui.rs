use crate::config::Settings;
use crate::controller::SessionController;
use crate::views::{ChatSidebar, ChatView};
use dioxus::prelude::*;

const APP_CSS: &str = r#"
:root {
    --color-bg-primary: #000000;
    --color-bg-secondary: #0b0b0b;
    --color-text-primary: #ffffff;
    --color-text-muted: #9a9a9a;
    --color-border: #2a2a2a;
    --color-chat-user-bg: #ffffff;
    --color-chat-user-text: #000000;
}
body { margin: 0; background: var(--color-bg-primary); color: var(--color-text-primary); font-family: system-ui, sans-serif; }
.app-shell { display: flex; height: 100vh; }
.sidebar { width: 16rem; border-right: 1px solid var(--color-border); background: var(--color-bg-secondary); padding: 0.75rem; overflow-y: auto; }
.chat-history { list-style: none; padding: 0; margin: 0.75rem 0 0; }
.history-row { display: flex; gap: 0.25rem; align-items: center; }
.history-label { flex: 1; text-align: left; background: none; border: none; color: var(--color-text-primary); padding: 0.4rem; cursor: pointer; }
.main-container { flex: 1; display: flex; flex-direction: column; }
.chat-list { flex: 1; overflow-y: auto; padding: 1rem; }
.message-row { display: flex; margin-bottom: 0.75rem; }
.message-row.user { justify-content: flex-end; }
.bubble { max-width: 70%; padding: 0.5rem 0.75rem; border-radius: 0.75rem; }
.bubble.user { background: var(--color-chat-user-bg); color: var(--color-chat-user-text); white-space: pre-wrap; }
.bubble.system { border: 1px solid var(--color-border); }
.composer { border-top: 1px solid var(--color-border); padding: 0.75rem; display: flex; gap: 0.5rem; }
.composer textarea { flex: 1; resize: none; background: var(--color-bg-primary); color: var(--color-text-primary); border: 1px solid var(--color-border); border-radius: 0.5rem; padding: 0.5rem; }
.btn { border-radius: 0.5rem; padding: 0.4rem 0.8rem; cursor: pointer; }
.action-btn { background: none; border: none; color: var(--color-text-muted); cursor: pointer; }
.shimmer-text { color: var(--color-text-muted); }
"#;

#[component]
pub fn App() -> Element {
    let controller = use_signal(|| SessionController::open(&Settings::from_env()));

    // The controller also saves when dropped; this covers the window closing
    // while the signal is still alive.
    use_drop(move || {
        if let Ok(controller) = controller.try_peek() {
            controller.save_on_exit();
        }
    });

    rsx! {
        style { dangerous_inner_html: "{APP_CSS}" }
        div { class: "app-shell",
            ChatSidebar { controller }
            ChatView { controller }
        }
    }
}
