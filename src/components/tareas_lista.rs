//! Task List Component
//!
//! Statistics header, creation form and the cached task list.

use leptos::prelude::*;

use crate::components::{CrearTareaForm, EditarTareaModal, TareaItem};
use crate::context::use_app_context;
use crate::hooks::{refetch, use_query};
use crate::services::{ESTADISTICAS_KEY, TAREAS_KEY};
use crate::store::{use_ui_store, UiStateStoreFields};
use crate::view_state::ListView;

#[component]
pub fn TareasLista() -> impl IntoView {
    let ctx = use_app_context();
    let store = use_ui_store();

    let tareas = use_query(ctx.client(), TAREAS_KEY);
    let stats = use_query(ctx.client(), ESTADISTICAS_KEY);

    let retry = move |_| refetch(ctx.client(), TAREAS_KEY);

    view! {
        <section class="tareas">
            <header class="tareas-header">
                <h2>"Mis Tareas"</h2>
                {move || stats.get().data.map(|s| view! {
                    <div class="estadisticas">
                        <span>{format!("Total: {}", s.total)}</span>
                        <span>{format!("Completadas: {}", s.completadas)}</span>
                        <span>{format!("Pendientes: {}", s.pendientes)}</span>
                    </div>
                })}
            </header>

            <CrearTareaForm />

            {move || store.mutation_error().get().map(|msg| view! {
                <div class="error-banner">{msg}</div>
            })}

            {move || match ListView::from_state(&tareas.get()) {
                ListView::Loading => view! {
                    <p class="loading">"Cargando tareas..."</p>
                }.into_any(),
                ListView::Failed { message } => view! {
                    <div class="error">
                        <p>{message}</p>
                        <button class="btn btn-secondary" on:click=retry>"Reintentar"</button>
                    </div>
                }.into_any(),
                ListView::Empty => view! {
                    <p class="empty">"No hay tareas. ¡Crea una!"</p>
                }.into_any(),
                ListView::Items { items, refreshing } => view! {
                    <ul class="tareas-list" class:refreshing=refreshing>
                        {items.into_iter()
                            .map(|tarea| view! { <TareaItem tarea=tarea /> })
                            .collect_view()}
                    </ul>
                }.into_any(),
            }}

            <EditarTareaModal />
        </section>
    }
}
