use serde::Deserialize;

/// Request body for claiming a pending review.
#[derive(Debug, Deserialize)]
pub struct ClaimReviewRequest {
    pub review_id: String,
    /// Identifier the reviewer will keep using for follow-up calls.
    pub reviewer_id: String,
}
