//! Extractors whose rejections are the API's canned JSON responses.

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
    response::Response,
};
use serde::de::DeserializeOwned;

use crate::responses;

/// [`Query`] that rejects with [`responses::missing_parameters`].
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "Rejected query string");
                responses::missing_parameters()
            })?;
        Ok(QueryParams(query))
    }
}

/// [`Path`] that rejects with [`responses::missing_parameters`].
#[derive(Debug)]
pub struct PathParams<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(path) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "Rejected path parameters");
                responses::missing_parameters()
            })?;
        Ok(PathParams(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default)]
        fresh: bool,
    }

    fn parts(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .body(())
            .expect("request")
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn parses_valid_query() {
        let QueryParams(flags) =
            QueryParams::<Flags>::from_request_parts(&mut parts("/?fresh=true"), &())
                .await
                .expect("query");
        assert!(flags.fresh);
    }

    #[tokio::test]
    async fn bad_query_is_missing_parameters() {
        let rejection = QueryParams::<Flags>::from_request_parts(&mut parts("/?fresh=maybe"), &())
            .await
            .expect_err("should reject");
        assert_eq!(rejection.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            rejection
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }
}
