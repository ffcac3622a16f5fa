//! UI Components
//!
//! Reusable Leptos components.

mod bug_hunt_panel;
mod crear_tarea_form;
mod delete_confirm_button;
mod editar_tarea_modal;
mod progress_list;
mod tarea_item;
mod tareas_lista;

pub use bug_hunt_panel::BugHuntPanel;
pub use crear_tarea_form::CrearTareaForm;
pub use delete_confirm_button::DeleteConfirmButton;
pub use editar_tarea_modal::EditarTareaModal;
pub use progress_list::ProgressList;
pub use tarea_item::TareaItem;
pub use tareas_lista::TareasLista;
