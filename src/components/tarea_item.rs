//! Task Item Component
//!
//! One row: completion checkbox, name, edit and delete actions. Rows still
//! waiting for the server are shown but not actionable.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::DeleteConfirmButton;
use crate::context::use_app_context;
use crate::models::Tarea;
use crate::resource::Record;
use crate::store::{store_set_error, store_start_editing, use_ui_store};
use crate::view_state::error_message;

#[component]
pub fn TareaItem(tarea: Record<Tarea>) -> impl IntoView {
    let ctx = use_app_context();
    let store = use_ui_store();

    let pending = tarea.is_pending();
    let completada = tarea.fields.completada;
    let nombre = tarea.fields.nombre.clone();
    let tarea = StoredValue::new(tarea);
    let (busy, set_busy) = signal(false);
    let disabled = Signal::derive(move || pending || busy.get());

    let toggle = move |_| {
        let tarea = tarea.get_value();
        set_busy.set(true);
        spawn_local(async move {
            let result = ctx.tareas().alternar(&tarea).await;
            store_set_error(&store, result.err().map(|e| error_message(&e)));
            let _ = set_busy.try_set(false);
        });
    };

    let eliminar = move |()| {
        let id = tarea.get_value().id;
        set_busy.set(true);
        spawn_local(async move {
            let result = ctx.tareas().eliminar(&id).await;
            store_set_error(&store, result.err().map(|e| error_message(&e)));
            let _ = set_busy.try_set(false);
        });
    };

    view! {
        <li
            class="tarea-item"
            class:completada=completada
            class:pending=pending
            class:loading=move || busy.get()
        >
            <div class="tarea-checkbox">
                <input
                    type="checkbox"
                    prop:checked=completada
                    disabled=move || disabled.get()
                    on:change=toggle
                />
            </div>
            <div class="tarea-nombre">
                <span>{nombre}</span>
                {pending.then(|| view! { <small class="tarea-saving">" guardando..."</small> })}
            </div>
            <div class="tarea-acciones">
                <button
                    class="btn btn-small btn-edit"
                    title="Editar tarea"
                    disabled=move || disabled.get()
                    on:click=move |_| store_start_editing(&store, tarea.get_value())
                >
                    "✏️"
                </button>
                <DeleteConfirmButton on_confirm=eliminar disabled=disabled />
            </div>
        </li>
    }
}
