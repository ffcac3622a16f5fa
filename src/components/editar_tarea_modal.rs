//! Edit Task Modal Component
//!
//! Open while the UI store holds a task being edited.

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::use_app_context;
use crate::models::{ActualizarTarea, NOMBRE_MAX_CHARS};
use crate::store::{store_stop_editing, use_ui_store, UiStateStoreFields};
use crate::view_state::error_message;

#[component]
pub fn EditarTareaModal() -> impl IntoView {
    let ctx = use_app_context();
    let store = use_ui_store();

    let (nombre, set_nombre) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (saving, set_saving) = signal(false);

    // Reset the form whenever a different task is opened
    Effect::new(move |_| {
        if let Some(tarea) = store.editing().get() {
            set_nombre.set(tarea.fields.nombre.clone());
            set_error.set(None);
        }
    });

    let cerrar = move || store_stop_editing(&store);

    let guardar = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(tarea) = store.editing().get_untracked() else {
            return;
        };
        let text = nombre.get();
        set_saving.set(true);
        spawn_local(async move {
            match ctx.tareas().actualizar(&tarea.id, ActualizarTarea::nombre(&text)).await {
                Ok(_) => store_stop_editing(&store),
                Err(e) => set_error.set(Some(error_message(&e))),
            }
            set_saving.set(false);
        });
    };

    view! {
        <Show when=move || store.editing().get().is_some()>
            <div class="modal-overlay" on:click=move |_| cerrar()>
                <div class="modal-content" on:click=|ev| ev.stop_propagation()>
                    <h2>"Editar Tarea"</h2>
                    <form on:submit=guardar>
                        <div class="form-group">
                            <label for="nombre">"Nombre de la tarea:"</label>
                            <input
                                id="nombre"
                                type="text"
                                class="form-input"
                                class:error=move || error.get().is_some()
                                maxlength=NOMBRE_MAX_CHARS.to_string()
                                prop:value=move || nombre.get()
                                on:input=move |ev| set_nombre.set(event_target_value(&ev))
                                disabled=move || saving.get()
                            />
                            {move || error.get().map(|msg| view! { <span class="error-message">{msg}</span> })}
                        </div>
                        <div class="modal-actions">
                            <button type="button" class="btn btn-secondary" on:click=move |_| cerrar()>
                                "Cancelar"
                            </button>
                            <button type="submit" class="btn btn-primary" disabled=move || saving.get()>
                                {move || if saving.get() { "Guardando..." } else { "Guardar" }}
                            </button>
                        </div>
                    </form>
                </div>
            </div>
        </Show>
    }
}
