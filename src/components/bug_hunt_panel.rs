//! Bug Hunt Component
//!
//! One game at a time: mark the suspicious lines, submit, and the
//! leaderboard below refreshes with the new score.

use std::collections::BTreeSet;

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::context::use_app_context;
use crate::hooks::use_query;
use crate::models::{AchievementAction, BugHuntResult, BugHuntSession};
use crate::services::{elapsed_seconds, BugHuntService, PlayerService};
use crate::view_state::error_message;

#[component]
pub fn BugHuntPanel(player_id: i64) -> impl IntoView {
    let ctx = use_app_context();
    let service = BugHuntService::connect(ctx.client(), ctx.rest(), &ctx.config(), player_id);
    let player = PlayerService::connect(ctx.client(), ctx.rest(), &ctx.config(), player_id);
    let leaderboard = use_query(ctx.client(), service.leaderboard_query(None));
    let service = StoredValue::new_local(service);
    let player = StoredValue::new_local(player);

    let (session, set_session) = signal::<Option<BugHuntSession>>(None);
    let (marked, set_marked) = signal(BTreeSet::<u32>::new());
    let (result, set_result) = signal::<Option<BugHuntResult>>(None);
    let (error, set_error) = signal::<Option<String>>(None);

    let start = move |_| {
        let service = service.get_value();
        spawn_local(async move {
            match service.start(None).await {
                Ok(game) => {
                    let _ = set_marked.try_set(BTreeSet::new());
                    let _ = set_result.try_set(None);
                    let _ = set_error.try_set(None);
                    let _ = set_session.try_set(Some(game));
                }
                Err(e) => {
                    let _ = set_error.try_set(Some(error_message(&e)));
                }
            }
        });
    };

    let submit = move |_| {
        let Some(game) = session.get_untracked() else {
            return;
        };
        let lines: Vec<u32> = marked.get_untracked().into_iter().collect();
        let service = service.get_value();
        let player = player.get_value();
        spawn_local(async move {
            let outcome = match elapsed_seconds(&game, chrono::Utc::now()) {
                Ok(seconds) => service.submit(&game, lines, seconds).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(graded) => {
                    if graded.success {
                        let data = serde_json::json!({ "score": graded.score, "is_perfect": graded.is_perfect });
                        let _ = player.check_achievements(AchievementAction::BugHuntWin, Some(data)).await;
                    }
                    let _ = set_session.try_set(None);
                    let _ = set_result.try_set(Some(graded));
                }
                Err(e) => {
                    let _ = set_error.try_set(Some(error_message(&e)));
                }
            }
        });
    };

    let toggle = move |line: u32| {
        set_marked.update(|lines| {
            if !lines.remove(&line) {
                lines.insert(line);
            }
        });
    };

    view! {
        <section class="bug-hunt">
            <header>
                <h2>"🐛 Bug Hunt"</h2>
                <button class="btn btn-secondary" on:click=start>"Nueva partida"</button>
            </header>

            {move || error.get().map(|msg| view! { <div class="error-banner">{msg}</div> })}

            {move || session.get().map(|game| view! {
                <div class="bug-hunt-game">
                    <h3>{game.title.clone()}</h3>
                    <p>{format!("{} · {} bugs", game.difficulty.as_str(), game.bugs_count)}</p>
                    <ol class="code-lines">
                        {game.code.lines().enumerate().map(|(i, text)| {
                            let line = i as u32 + 1;
                            view! {
                                <li
                                    class="code-line"
                                    class:marked=move || marked.get().contains(&line)
                                    on:click=move |_| toggle(line)
                                >
                                    <code>{text.to_string()}</code>
                                </li>
                            }
                        }).collect_view()}
                    </ol>
                    <button class="btn btn-primary" on:click=submit>"Enviar"</button>
                </div>
            })}

            {move || result.get().map(|graded| view! {
                <p class="bug-hunt-result">
                    {format!(
                        "{} / {} bugs · {} puntos · +{} XP",
                        graded.bugs_found, graded.bugs_total, graded.score, graded.xp_earned
                    )}
                </p>
            })}

            {move || leaderboard.get().data.map(|board| view! {
                <ol class="leaderboard">
                    {board.entries.into_iter().map(|entry| view! {
                        <li class:me={entry.player_id == player_id}>
                            {format!("{}. {} · {}", entry.rank, entry.username, entry.score)}
                        </li>
                    }).collect_view()}
                </ol>
            })}
        </section>
    }
}
