use dioxus::prelude::*;
use radar_shared::i18n::localize;

use crate::components::radar_card::MarkerForm;

fn close(mut form: Signal<Option<MarkerForm>>, mut error: Signal<Option<String>>) {
    error.set(None);
    form.set(None);
}

/// Create/edit form for a marker. Coordinates are editable only for existing markers;
/// new ones are dropped at the current center. A press outside the dialog closes it.
#[component]
pub fn MarkerDialog(
    form: Signal<Option<MarkerForm>>,
    error: Signal<Option<String>>,
    language: String,
    on_save: EventHandler<MarkerForm>,
    on_delete: EventHandler<String>,
) -> Element {
    let Some(current) = form.read().clone() else {
        return rsx! {};
    };
    let text = |key: &'static str| localize(&language, key).to_string();
    let title = if current.editing.is_some() {
        text("marker.edit")
    } else {
        text("marker.add")
    };
    let name_label = text("marker.name");
    let color_label = text("marker.color");
    let latitude_label = text("marker.latitude");
    let longitude_label = text("marker.longitude");
    let save_label = text("marker.save");
    let delete_label = text("marker.delete");
    let cancel_label = text("marker.cancel");

    rsx! {
        div {
            class: "marker-dialog-backdrop",
            onmousedown: move |_| close(form, error),
        }
        div { class: "marker-dialog",
            h3 { "{title}" }
            label {
                "{name_label}"
                input {
                    r#type: "text",
                    value: "{current.name}",
                    oninput: move |evt: Event<FormData>| {
                        if let Some(f) = form.write().as_mut() {
                            f.name = evt.value();
                        }
                    },
                }
            }
            label {
                "{color_label}"
                input {
                    r#type: "text",
                    placeholder: "#ff9800",
                    value: "{current.color}",
                    oninput: move |evt: Event<FormData>| {
                        if let Some(f) = form.write().as_mut() {
                            f.color = evt.value();
                        }
                    },
                }
            }
            if current.editing.is_some() {
                label {
                    "{latitude_label}"
                    input {
                        r#type: "text",
                        value: "{current.latitude}",
                        oninput: move |evt: Event<FormData>| {
                            if let Some(f) = form.write().as_mut() {
                                f.latitude = evt.value();
                            }
                        },
                    }
                }
                label {
                    "{longitude_label}"
                    input {
                        r#type: "text",
                        value: "{current.longitude}",
                        oninput: move |evt: Event<FormData>| {
                            if let Some(f) = form.write().as_mut() {
                                f.longitude = evt.value();
                            }
                        },
                    }
                }
            }
            if let Some(message) = &*error.read() {
                div { class: "marker-error", "{message}" }
            }
            div { class: "marker-dialog-actions",
                button {
                    onclick: {
                        let submitted = current.clone();
                        move |_| on_save.call(submitted.clone())
                    },
                    "{save_label}"
                }
                if let Some(id) = current.editing.clone() {
                    button {
                        class: "danger",
                        onclick: move |_| on_delete.call(id.clone()),
                        "{delete_label}"
                    }
                }
                button {
                    class: "secondary",
                    onclick: move |_| close(form, error),
                    "{cancel_label}"
                }
            }
        }
    }
}
