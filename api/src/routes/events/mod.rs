pub mod events_route;
pub mod log_tail;
