use crate::error::{AppError, AppResult};
use axum::extract::{
    FromRequest, FromRequestParts, Json, Query, Request,
    rejection::{JsonRejection, QueryRejection},
};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::from(e))?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Quote {
        #[validate(range(exclusive_min = 0.0, message = "Property price must be positive"))]
        property_price: f64,
        #[validate(range(min = 12, max = 360, message = "Loan period must be between 12 and 360 months"))]
        loan_period: u32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json() {
        let request = json_request(r#"{"property_price": 5000000, "loan_period": 300}"#);
        let ValidatedJson(quote) = ValidatedJson::<Quote>::from_request(request, &()).await.unwrap();
        assert_eq!(quote.property_price, 5_000_000.0);
        assert_eq!(quote.loan_period, 300);
    }

    #[tokio::test]
    async fn test_json_rule_violations_are_collected() {
        let request = json_request(r#"{"property_price": 0, "loan_period": 400}"#);
        match ValidatedJson::<Quote>::from_request(request, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["loan_period", "property_price"]);
            }
            other => panic!("Expected ValidationErrors, got {:?}", other.map(|v| v.0)),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request(r#"{"property_price": "#);
        assert!(matches!(
            ValidatedJson::<Quote>::from_request(request, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_validation() {
        let request = Request::builder()
            .uri("/test?property_price=100&loan_period=6")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        match ValidatedQuery::<Quote>::from_request_parts(&mut parts, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "loan_period");
            }
            other => panic!("Expected ValidationErrors, got {:?}", other.map(|v| v.0)),
        }
    }

    #[tokio::test]
    async fn test_unparseable_query_is_bad_request() {
        let request = Request::builder()
            .uri("/test?property_price=abc&loan_period=12")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(matches!(
            ValidatedQuery::<Quote>::from_request_parts(&mut parts, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }
}
