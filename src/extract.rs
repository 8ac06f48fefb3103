use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::errors::{AppError, FieldError};

/// JSON body extractor whose rejections use the API error envelope.
/// Broken JSON is a `BAD_REQUEST`; well-formed JSON of the wrong shape is a
/// `VALIDATION_ERROR` naming the offending field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| AppError::bad_request(err.body_text()))?;
        parse_json(&bytes).map(JsonBody)
    }
}

pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        match inner.classify() {
            Category::Data => AppError::validation(vec![FieldError::new(field_name(&path, &inner), inner.to_string())]),
            Category::Syntax | Category::Eof | Category::Io => AppError::bad_request("invalid JSON format"),
        }
    })?;

    deserializer
        .end()
        .map_err(|_| AppError::bad_request("invalid JSON format"))?;
    Ok(value)
}

fn field_name(path: &str, err: &serde_json::Error) -> String {
    if path != "." {
        return path.to_string();
    }
    // serde reports missing fields against the parent
    let message = err.to_string();
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
        .map(str::to_string)
        .unwrap_or_else(|| "body".to_string())
}
