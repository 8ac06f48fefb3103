use axum::Json;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::extract::JsonBody;
use crate::models::contact::{ContactRequest, ContactResponse};

#[utoipa::path(
    post,
    path = "/contact",
    tag = "Contact",
    security(()),
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Inquiry received", body = ContactResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn submit(JsonBody(payload): JsonBody<ContactRequest>) -> AppResult<Json<ContactResponse>> {
    let submission = payload.validate()?;
    let contact_id = Uuid::new_v4().to_string();

    // no mail delivery; the log is the record
    tracing::info!(
        contact_id = %contact_id,
        category = %submission.category,
        email = %submission.email,
        length = submission.message.chars().count(),
        "contact form received"
    );

    Ok(Json(ContactResponse {
        message: "thank you for your inquiry".into(),
        contact_id,
    }))
}
