//! Weekly activity routines: model, storage, generation prompts, and routes.

pub mod model;
pub mod prompts;
pub mod repo;
pub mod routes;

pub use model::{Activity, DayOfWeek, Reminder, Routine, generate_routine_id, is_valid_time};
pub use prompts::ChildPreferences;
pub use repo::{InMemoryRoutineRepository, RoutineRepository};
pub use routes::{RoutineRouteState, routine_routes};
