pub mod activity_feed_route;
pub mod audit_log_route;
pub mod stats_route;
pub mod timeline_route;
