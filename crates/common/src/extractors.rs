//! Request extractors shared by the domain routers

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::Error;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 50;

/// `?limit=&offset=` for list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Rows to skip, never negative
    pub fn offset(&self) -> i64 {
        self.offset.map_or(0, |o| o.max(0))
    }

    /// Page size in `1..=50`, 20 when absent
    pub fn limit(&self) -> i64 {
        self.limit
            .map_or(DEFAULT_PAGE_SIZE, |l| l.clamp(1, MAX_PAGE_SIZE))
    }
}

/// JSON body that has passed its `validator` rules.
///
/// Payload types opt into `#[serde(deny_unknown_fields)]` themselves; a body
/// that fails to parse and one that fails validation both answer 400.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[derive(Debug)]
pub enum ValidatedJsonRejection {
    Malformed(JsonRejection),
    Invalid(Error),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let error = match self {
            ValidatedJsonRejection::Malformed(rejection) => {
                Error::Validation(rejection.body_text())
            }
            ValidatedJsonRejection::Invalid(error) => error,
        };
        error.into_response()
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Malformed)?;

        payload
            .validate()
            .map_err(|e| ValidatedJsonRejection::Invalid(Error::Validation(e.to_string())))?;

        Ok(ValidatedJson(payload))
    }
}
