use crate::archive::summarize;
use crate::controller::SessionController;
use crate::types::ChatId;
use dioxus::prelude::*;

#[component]
pub fn ChatSidebar(controller: Signal<SessionController>) -> Element {
    let mut controller = controller;
    // Rows address chats by id so a delete never shifts a click onto the wrong entry.
    let entries: Vec<(ChatId, String)> = controller.with(|ctrl| {
        ctrl.archive()
            .iter()
            .enumerate()
            .map(|(i, chat)| (chat.id, summarize(&chat.conversation, i)))
            .collect()
    });
    // A reply always lands in the active conversation, so switching waits for it.
    let sending = controller.with(|ctrl| ctrl.is_sending());

    rsx! {
        aside { class: "sidebar",
            button {
                class: "btn btn-primary", r#type: "button", disabled: sending,
                onclick: move |_| {
                    controller.write().new_chat();
                },
                "New chat"
            }
            ul { class: "chat-history",
                for (id, label) in entries {
                    li { key: "{id}", class: "history-row",
                        button {
                            class: "history-label", r#type: "button", disabled: sending,
                            onclick: move |_| {
                                if let Err(err) = controller.write().load_chat_by_id(id) {
                                    tracing::warn!(error = %err, "could not open saved chat");
                                }
                            },
                            "{label}"
                        }
                        button {
                            class: "action-btn", r#type: "button", title: "Delete chat",
                            disabled: sending,
                            onclick: move |_| {
                                controller.write().delete_chat_by_id(id);
                            },
                            "Delete"
                        }
                    }
                }
            }
        }
    }
}
