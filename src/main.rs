//! Tareas Frontend Entry Point
//!
//! In the browser this mounts the app. Natively it prints the task list and
//! statistics, which is handy for checking a backend from a terminal.

#[cfg(target_arch = "wasm32")]
fn main() {
    use leptos::prelude::*;

    if let Err(e) = tareas_ui::telemetry::init() {
        web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
    }
    mount_to_body(tareas_ui::App);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::path::PathBuf;

    let log_dir = std::env::var("TAREAS_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("tareas-ui"));
    if let Err(e) = tareas_ui::telemetry::init(log_dir) {
        eprintln!("Logger init failed: {}", e);
    }

    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(cli::run()),
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::process::ExitCode;
    use std::rc::Rc;

    use tareas_ui::api::{HttpTareas, RestClient};
    use tareas_ui::config::ClientConfig;
    use tareas_ui::services::TareasService;
    use tareas_ui::QueryClient;

    pub async fn run() -> ExitCode {
        let config = match ClientConfig::from_env() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        };
        let rest = RestClient::from_config(&config);
        let service = TareasService::new(QueryClient::new(), Rc::new(HttpTareas::new(rest)), &config);

        let tareas = match service.lista().await {
            Ok(tareas) => tareas,
            Err(e) => {
                eprintln!("Failed to load tareas: {}", e);
                let _ = rolling_logger::error(&format!("Failed to load tareas: {}", e));
                return ExitCode::FAILURE;
            }
        };
        for tarea in &tareas {
            let mark = if tarea.fields.completada { "x" } else { " " };
            println!("[{}] {:>4}  {}", mark, tarea.key(), tarea.fields.nombre);
        }
        if let Ok(stats) = service.estadisticas().await {
            println!(
                "{} total, {} completadas, {} pendientes",
                stats.total, stats.completadas, stats.pendientes
            );
        }
        ExitCode::SUCCESS
    }
}
