pub mod add_message_request;
pub mod add_message_route;
pub mod get_discussion_route;
