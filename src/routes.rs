use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
};

use crate::{
    AppState,
    catalog::MovieFilter,
    error::{AppError, AppResult},
    models::{
        ActorDetail, ActorListItem, CreateRating, CreateReview, MovieDetail, MovieListItem,
        MovieQuery, RatingView, ReviewView,
    },
    pagination::{Page, PageQuery, PageRequest},
    viewer::ViewerIp,
};

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    viewer: Option<ViewerIp>,
    query: Result<Query<MovieQuery>, QueryRejection>,
    paging: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<Page<MovieListItem>>> {
    let (Query(query), Query(paging)) = (query?, paging?);
    let filter = MovieFilter::parse(&query)?;
    let page = state.page_request(&paging)?;
    let (items, count) = state
        .catalog
        .list_movies(&filter, page, viewer.as_ref().map(ViewerIp::as_str))
        .await?;
    Ok(Json(Page::new(items, count, page, &uri)))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    viewer: Option<ViewerIp>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<MovieDetail>> {
    let Ok(Path(id)) = id else {
        return Err(AppError::not_found());
    };
    let detail = state.catalog.get_movie(id, viewer.as_ref().map(ViewerIp::as_str)).await?;
    Ok(Json(detail))
}

pub async fn list_actors(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    paging: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<Page<ActorListItem>>> {
    let Query(paging) = paging?;
    let page = state.page_request(&paging)?;
    let (items, count) = state.catalog.list_actors(page).await?;
    Ok(Json(Page::new(items, count, page, &uri)))
}

pub async fn get_actor(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Json<ActorDetail>> {
    let Ok(Path(id)) = id else {
        return Err(AppError::not_found());
    };
    Ok(Json(state.catalog.get_actor(id).await?))
}

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateReview>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ReviewView>)> {
    let Json(payload) = payload?;
    let review = state.reviews.create(payload).await?;
    Ok((StatusCode::CREATED, Json(ReviewView::from(review))))
}

pub async fn create_rating(
    State(state): State<Arc<AppState>>,
    viewer: ViewerIp,
    payload: Result<Json<CreateRating>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RatingView>)> {
    let Json(payload) = payload?;
    let rating = state.ratings.upsert_rating(viewer.as_str(), payload).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}

impl AppState {
    fn page_request(&self, paging: &PageQuery) -> AppResult<PageRequest> {
        PageRequest::parse(paging, self.config.page_size, self.config.max_page_size)
    }
}
