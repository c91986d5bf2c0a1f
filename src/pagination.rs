use axum::http::Uri;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const PAGE_PARAM: &str = "page";

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// 1-based page number and a page size already capped by config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn parse(query: &PageQuery, default_size: u64, max_size: u64) -> AppResult<Self> {
        let page = match query.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u64>() {
                Ok(page) if page > 0 => page,
                _ => return Err(invalid_page()),
            },
        };

        let page_size = match query.page_size.as_deref().map(str::trim) {
            None | Some("") => default_size,
            Some(raw) => match raw.parse::<u64>() {
                Ok(size) if size > 0 => size,
                _ => return Err(AppError::invalid("page_size", "A valid integer is required.")),
            },
        };

        Ok(Self { page, page_size: page_size.min(max_size.max(1)) })
    }

    /// Zero-based index for the paginator.
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    pub fn num_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.page_size).max(1)
    }

    /// Page 1 is always valid, even for an empty result.
    pub fn ensure_within(&self, count: u64) -> AppResult<()> {
        if self.page > self.num_pages(count) { Err(invalid_page()) } else { Ok(()) }
    }
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".to_string())
}

#[derive(Clone, Debug, Serialize)]
pub struct Links {
    pub next: Option<String>,
    pub previous: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub links: Links,
    pub count: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, request: PageRequest, uri: &Uri) -> Self {
        let next = (request.page < request.num_pages(count)).then(|| page_link(uri, request.page + 1));
        let previous = (request.page > 1).then(|| page_link(uri, request.page - 1));
        Self { links: Links { next, previous }, count, results }
    }
}

/// Rebuilds the request path and query with `page` replaced; page 1 drops the parameter.
fn page_link(uri: &Uri, page: u64) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .map(|(key, value)| (decode_component(key), decode_component(value)))
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| format!("{}={}", urlencoding::encode(&key), urlencoding::encode(&value)))
        .collect();

    if page > 1 {
        pairs.push(format!("{PAGE_PARAM}={page}"));
    }

    if pairs.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), pairs.join("&"))
    }
}

// Form encoding: `+` is a space.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}
