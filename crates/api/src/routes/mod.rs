//! HTTP route handlers

pub mod alerts;
pub mod reports;

use alert_model::{AlertError, AlertId};
use analytics::{AlertCriteria, Page, SortKey, SortOrder};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::str::FromStr;

use crate::error::ApiError;

/// Header carrying the operator performing a mutation
pub const OPERATOR_HEADER: &str = "x-operator-id";

/// Actor recorded when no operator header is sent
pub const DEFAULT_OPERATOR: &str = "system";

/// Operator id taken from the `x-operator-id` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Operator {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let operator = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_OPERATOR);
        Ok(Operator(operator.to_string()))
    }
}

/// JSON body; malformed or mistyped bodies become validation errors
#[derive(Debug, Clone, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| ValidJson(value))
            .map_err(|rejection| AlertError::validation(None, rejection.body_text()).into())
    }
}

/// Query string, rejected as a validation error when it does not deserialize
#[derive(Debug, Clone, Default)]
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ValidQuery(value))
            .map_err(|rejection| ApiError::invalid("query", rejection.body_text()))
    }
}

/// Alert id taken from the `:id` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPath(pub AlertId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AlertPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<u64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| AlertPath(AlertId(id)))
            .map_err(|rejection| ApiError::invalid("id", rejection.body_text()))
    }
}

/// Query-string form of `AlertCriteria` plus pagination
///
/// Set filters are comma separated (`severity=high,critical`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertQueryParams {
    pub text: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub active_only: Option<bool>,
    pub sort_by: Option<SortKey>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Only read by the dashboard route
    pub window: Option<String>,
}

impl AlertQueryParams {
    pub fn criteria(&self) -> Result<AlertCriteria, ApiError> {
        Ok(AlertCriteria {
            text: self.text.clone(),
            severity: parse_set(self.severity.as_deref())?,
            status: parse_set(self.status.as_deref())?,
            category: parse_set(self.category.as_deref())?,
            source: parse_set(self.source.as_deref())?,
            active_only: self.active_only.unwrap_or(false),
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        })
    }

    pub fn page(&self) -> Page {
        let default = Page::default();
        Page {
            offset: self.offset.unwrap_or(default.offset),
            limit: self.limit.unwrap_or(default.limit),
        }
    }
}

fn parse_set<T>(raw: Option<&str>) -> Result<BTreeSet<T>, ApiError>
where
    T: FromStr<Err = alert_model::ParseEnumError> + Ord,
{
    let Some(raw) = raw else {
        return Ok(BTreeSet::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| ApiError::from(AlertError::validation(None, e.to_string())))
        })
        .collect()
}
