//! Create Task Form Component

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::use_app_context;
use crate::models::NOMBRE_MAX_CHARS;
use crate::view_state::error_message;

#[component]
pub fn CrearTareaForm() -> impl IntoView {
    let ctx = use_app_context();

    let (nombre, set_nombre) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (saving, set_saving) = signal(false);

    let crear = move |ev: SubmitEvent| {
        ev.prevent_default();
        let text = nombre.get();
        set_saving.set(true);
        spawn_local(async move {
            match ctx.tareas().crear(&text).await {
                Ok(_) => {
                    set_nombre.set(String::new());
                    set_error.set(None);
                }
                Err(e) => set_error.set(Some(error_message(&e))),
            }
            set_saving.set(false);
        });
    };

    view! {
        <form class="crear-tarea-form" on:submit=crear>
            <div class="form-group">
                <input
                    type="text"
                    class="form-input"
                    class:error=move || error.get().is_some()
                    placeholder="Nueva tarea..."
                    maxlength=NOMBRE_MAX_CHARS.to_string()
                    prop:value=move || nombre.get()
                    on:input=move |ev| set_nombre.set(event_target_value(&ev))
                    disabled=move || saving.get()
                />
                <button type="submit" class="btn btn-primary" disabled=move || saving.get()>
                    {move || if saving.get() { "Creando..." } else { "Agregar" }}
                </button>
            </div>
            {move || error.get().map(|msg| view! { <span class="error-message">{msg}</span> })}
        </form>
    }
}
