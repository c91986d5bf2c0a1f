use futures::TryFutureExt;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
    sea_query::{Expr, Query},
};
use tracing::debug;

use crate::{
    aggregate,
    entities::{actor, category, genre, movie, movie_genre, movie_shot},
    error::{AppError, AppResult, FieldErrors},
    models::{ActorDetail, ActorListItem, MovieDetail, MovieListItem, MovieQuery, MovieShotItem},
    pagination::PageRequest,
    reviews::ReviewStore,
};

/// Looks up a movie that end users may see. Drafts are treated as missing.
pub async fn find_published_movie<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> AppResult<Option<movie::Model>> {
    Ok(movie::Entity::find_by_id(id).filter(movie::Column::Draft.eq(false)).one(db).await?)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovieFilter {
    /// Genre names; a movie matches when tagged with any of them.
    pub genres: Vec<String>,
    pub year_min: Option<i16>,
    pub year_max: Option<i16>,
}

impl MovieFilter {
    pub fn parse(query: &MovieQuery) -> AppResult<Self> {
        let mut genres: Vec<String> = query
            .genres
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        genres.sort();
        genres.dedup();

        let mut errors = FieldErrors::new();
        let year_min = parse_year(&mut errors, "year_min", query.year_min.as_deref());
        let year_max = parse_year(&mut errors, "year_max", query.year_max.as_deref());
        errors.into_result()?;

        Ok(Self { genres, year_min, year_max })
    }
}

fn parse_year(errors: &mut FieldErrors, field: &str, raw: Option<&str>) -> Option<i16> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse() {
        Ok(year) => Some(year),
        Err(_) => {
            errors.add(field, "Enter a number.");
            None
        },
    }
}

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
    reviews: ReviewStore,
}

impl Catalog {
    pub fn new(db: DatabaseConnection, reviews: ReviewStore) -> Self {
        Self { db, reviews }
    }

    pub async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
        viewer_ip: Option<&str>,
    ) -> AppResult<(Vec<MovieListItem>, u64)> {
        let mut query = movie::Entity::find().filter(movie::Column::Draft.eq(false));

        if !filter.genres.is_empty() {
            // Subquery rather than a join so a movie tagged with several matching genres is
            // returned once.
            let tagged = Query::select()
                .column((movie_genre::Entity, movie_genre::Column::MovieId))
                .from(movie_genre::Entity)
                .inner_join(
                    genre::Entity,
                    Expr::col((genre::Entity, genre::Column::Id))
                        .equals((movie_genre::Entity, movie_genre::Column::GenreId)),
                )
                .and_where(Expr::col((genre::Entity, genre::Column::Name)).is_in(filter.genres.clone()))
                .to_owned();
            query = query.filter(movie::Column::Id.in_subquery(tagged));
        }
        if let Some(min) = filter.year_min {
            query = query.filter(movie::Column::Year.gte(min));
        }
        if let Some(max) = filter.year_max {
            query = query.filter(movie::Column::Year.lte(max));
        }

        let paginator = query
            .order_by_asc(movie::Column::Id)
            .find_also_related(category::Entity)
            .paginate(&self.db, page.page_size);

        let count = paginator.num_items().await?;
        page.ensure_within(count)?;
        let rows = paginator.fetch_page(page.index()).await?;

        let ids: Vec<i32> = rows.iter().map(|(movie, _)| movie.id).collect();
        let stats = aggregate::movie_stats(&self.db, &ids, viewer_ip).await?;

        debug!(count, page = page.page, returned = rows.len(), ?filter, "listed movies");

        let items = rows
            .into_iter()
            .map(|(movie, category)| {
                let stats = stats.get(&movie.id).copied().unwrap_or_default();
                MovieListItem {
                    id: movie.id,
                    title: movie.title,
                    tagline: movie.tagline,
                    category: category.map(|c| c.name),
                    middle_star: stats.middle_star,
                    rating_user: stats.rating_user,
                }
            })
            .collect();

        Ok((items, count))
    }

    pub async fn get_movie(&self, id: i32, viewer_ip: Option<&str>) -> AppResult<MovieDetail> {
        let Some((movie, category)) = movie::Entity::find_by_id(id)
            .filter(movie::Column::Draft.eq(false))
            .find_also_related(category::Entity)
            .one(&self.db)
            .await?
        else {
            debug!(movie_id = id, "movie not found or draft");
            return Err(AppError::not_found());
        };

        let ids = [movie.id];
        let (actors, directors, genres, shots, reviews, stats) = futures::try_join!(
            movie
                .find_linked(movie::CastLink)
                .order_by_asc(actor::Column::Id)
                .all(&self.db)
                .err_into::<AppError>(),
            movie
                .find_linked(movie::DirectorLink)
                .order_by_asc(actor::Column::Id)
                .all(&self.db)
                .err_into::<AppError>(),
            movie
                .find_related(genre::Entity)
                .order_by_asc(genre::Column::Id)
                .all(&self.db)
                .err_into::<AppError>(),
            movie
                .find_related(movie_shot::Entity)
                .order_by_asc(movie_shot::Column::Id)
                .all(&self.db)
                .err_into::<AppError>(),
            self.reviews.forest(movie.id),
            aggregate::movie_stats(&self.db, &ids, viewer_ip),
        )?;

        let stats = stats.get(&movie.id).copied().unwrap_or_default();
        let mut detail = MovieDetail::from_movie(movie, category.map(|c| c.name));
        detail.actors = actors.into_iter().map(|a| a.name).collect();
        detail.directors = directors.into_iter().map(|a| a.name).collect();
        detail.genres = genres.into_iter().map(|g| g.name).collect();
        detail.movie_shots = shots.into_iter().map(MovieShotItem::from).collect();
        detail.reviews = reviews;
        detail.middle_star = stats.middle_star;
        detail.rating_user = stats.rating_user;
        Ok(detail)
    }

    pub async fn list_actors(&self, page: PageRequest) -> AppResult<(Vec<ActorListItem>, u64)> {
        let paginator =
            actor::Entity::find().order_by_asc(actor::Column::Id).paginate(&self.db, page.page_size);

        let count = paginator.num_items().await?;
        page.ensure_within(count)?;
        let actors = paginator.fetch_page(page.index()).await?;

        Ok((actors.into_iter().map(ActorListItem::from).collect(), count))
    }

    pub async fn get_actor(&self, id: i32) -> AppResult<ActorDetail> {
        actor::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(ActorDetail::from)
            .ok_or_else(AppError::not_found)
    }
}
