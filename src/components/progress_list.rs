//! Module Progress Component
//!
//! Classes of one academy module with their status. Unlocked and
//! in-progress classes can be advanced; the change shows immediately.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::use_app_context;
use crate::hooks::{refetch, use_query};
use crate::models::{AchievementAction, Progress, ProgressStatus};
use crate::resource::Record;
use crate::services::{next_unlockable_key, player_stats_key, AcademyService, PlayerService};
use crate::view_state::{error_message, ListView};

fn status_label(status: ProgressStatus) -> &'static str {
    match status {
        ProgressStatus::Locked => "🔒 Bloqueada",
        ProgressStatus::Unlocked => "🔓 Disponible",
        ProgressStatus::InProgress => "⏳ En progreso",
        ProgressStatus::Completed => "✅ Completada",
    }
}

#[component]
pub fn ProgressList(player_id: i64, module_number: u32) -> impl IntoView {
    let ctx = use_app_context();
    let service = AcademyService::connect(
        ctx.client(),
        ctx.rest(),
        &ctx.config(),
        player_id,
        module_number,
    );
    let player = PlayerService::connect(ctx.client(), ctx.rest(), &ctx.config(), player_id);
    let progress_key = service.progress_key();
    let service = StoredValue::new_local(service);
    let player = StoredValue::new_local(player);

    let progress = use_query(ctx.client(), progress_key.clone());
    let stats = use_query(ctx.client(), player_stats_key(player_id));
    let next = use_query(ctx.client(), next_unlockable_key(player_id));
    let (error, set_error) = signal::<Option<String>>(None);

    let advance = move |record: Record<Progress>| {
        let service = service.get_value();
        let player = player.get_value();
        spawn_local(async move {
            let result = service.advance(&record).await;
            if let Ok(advanced) = &result {
                if advanced.fields.status == ProgressStatus::Completed {
                    let data = serde_json::json!({
                        "module_number": advanced.fields.module_number,
                        "class_number": advanced.fields.class_number,
                    });
                    // Achievements are a bonus; a failed check leaves progress intact
                    let _ = player.check_achievements(AchievementAction::CompleteClass, Some(data)).await;
                }
            }
            let _ = set_error.try_set(result.err().map(|e| error_message(&e)));
        });
    };
    let progress_key = StoredValue::new(progress_key);
    let retry = move |_| refetch(ctx.client(), progress_key.get_value());

    view! {
        <section class="academy-progress">
            <header>
                <h2>{format!("Módulo {}", module_number)}</h2>
                {move || stats.get().data.map(|s| view! {
                    <p class="player-stats">
                        {format!(
                            "{} clases · {} ejercicios · racha {}",
                            s.classes_completed, s.exercises_completed, s.current_streak
                        )}
                    </p>
                })}
                {move || next.get().data.flatten().map(|class| view! {
                    <p class="next-class">
                        {format!("Siguiente: {}.{} {} (+{} XP)", class.module_number, class.class_number, class.title, class.xp_reward)}
                    </p>
                })}
            </header>

            {move || error.get().map(|msg| view! { <div class="error-banner">{msg}</div> })}

            {move || match ListView::from_state(&progress.get()) {
                ListView::Loading => view! { <p class="loading">"Cargando progreso..."</p> }.into_any(),
                ListView::Failed { message } => view! {
                    <div class="error">
                        <p>{message}</p>
                        <button class="btn btn-secondary" on:click=retry>"Reintentar"</button>
                    </div>
                }.into_any(),
                ListView::Empty => view! { <p class="empty">"Sin clases desbloqueadas"</p> }.into_any(),
                ListView::Items { items, .. } => view! {
                    <ul class="class-list">
                        {items.into_iter().map(|record| {
                            let status = record.fields.status;
                            let can_advance = status.next().is_some() && !record.is_pending();
                            let label = format!("Clase {}", record.fields.class_number);
                            let record = StoredValue::new(record);
                            view! {
                                <li class="class-item" class:completed={status == ProgressStatus::Completed}>
                                    <span class="class-name">{label}</span>
                                    <span class="class-status">{status_label(status)}</span>
                                    <Show when=move || can_advance>
                                        <button
                                            class="btn btn-small"
                                            on:click=move |_| advance(record.get_value())
                                        >
                                            "Avanzar"
                                        </button>
                                    </Show>
                                </li>
                            }
                        }).collect_view()}
                    </ul>
                }.into_any(),
            }}
        </section>
    }
}
