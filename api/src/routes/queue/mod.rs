pub mod get_proposal_route;
pub mod get_review_status_route;
pub mod list_reviews_route;
