use crate::controller::SessionController;
use crate::render::markdown_to_html;
use crate::types::{Message, Sender};
use dioxus::events::Key;
use dioxus::prelude::*;

fn row_class(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::System => "system",
    }
}

#[component]
pub fn ChatView(controller: Signal<SessionController>) -> Element {
    let mut input = use_signal(String::new);

    let mut send_message = {
        let mut controller = controller;
        let mut input_signal = input;
        move || {
            // Records the user message and clears the composer before the request goes out.
            let started = {
                let mut text = input_signal.write();
                controller.write().begin_turn(&mut text)
            };
            let turn = match started {
                Ok(turn) => turn,
                Err(err) => {
                    tracing::debug!(error = %err, "submission ignored");
                    return;
                }
            };

            spawn(async move {
                let reply = turn.resolve().await;
                controller.write().finish_turn(reply);
            });
        }
    };

    let (messages, sending): (Vec<Message>, bool) =
        controller.with(|ctrl| (ctrl.session().messages().to_vec(), ctrl.is_sending()));

    rsx! {
        div { class: "main-container",
            div { id: "chat-list", class: "chat-list",
                for (i, msg) in messages.iter().enumerate() {
                    div { key: "{i}", class: format_args!("message-row {}", row_class(msg.sender())),
                        div { class: format_args!("bubble {}", row_class(msg.sender())),
                            if msg.is_user() {
                                "{msg.text()}"
                            } else {
                                SystemBubble { content: msg.text().to_string() }
                            }
                        }
                    }
                }
                if sending {
                    div { class: "message-row system",
                        div { class: "shimmer-text", "Thinking…" }
                    }
                }
            }

            form { class: "composer no-divider",
                textarea {
                    rows: "1", placeholder: "Ask anything",
                    value: "{input}", oninput: move |ev| input.set(ev.value()),
                    onkeydown: move |ev| {
                        if ev.key() == Key::Enter && !ev.modifiers().shift() {
                            ev.prevent_default();
                            send_message();
                        }
                    },
                    disabled: sending, autofocus: true,
                }
                button {
                    class: "btn btn-primary", r#type: "button",
                    disabled: sending || input().trim().is_empty(),
                    onclick: move |_| send_message(),
                    "Send"
                }
            }
        }
    }
}

#[component]
fn SystemBubble(content: String) -> Element {
    let content_html = markdown_to_html(&content);
    let on_copy = move |_| {
        let raw = content.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
        });
    };

    rsx! {
        div { class: "bubble-controls",
            button { class: "action-btn", title: "Copy markdown", onclick: on_copy, "Copy" }
        }
        div { class: "md", dangerous_inner_html: "{content_html}" }
    }
}
