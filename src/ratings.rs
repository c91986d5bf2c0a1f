use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use tracing::info;

use crate::{
    catalog,
    entities::{rating, rating_star},
    error::{AppError, AppResult, FieldErrors},
    models::{CreateRating, RatingView},
};

const IP_MAX: usize = 45;

#[derive(Clone)]
pub struct RatingStore {
    db: DatabaseConnection,
}

impl RatingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records the viewer's star for a movie, replacing any earlier vote from the same IP.
    ///
    /// A single `INSERT .. ON CONFLICT (ip, movie_id) DO UPDATE`, so concurrent votes from one
    /// viewer settle on the last writer and never produce a second row.
    pub async fn upsert_rating(&self, viewer_ip: &str, payload: CreateRating) -> AppResult<RatingView> {
        let ip = viewer_ip.trim();
        if ip.is_empty() || ip.len() > IP_MAX {
            return Err(AppError::invalid("ip", "Could not determine a valid client address."));
        }

        let mut errors = FieldErrors::new();

        let star = match payload.star {
            None => {
                errors.add("star", "This field is required.");
                None
            },
            Some(value) => {
                let star = rating_star::Entity::find()
                    .filter(rating_star::Column::Value.eq(value))
                    .one(&self.db)
                    .await?;
                if star.is_none() {
                    errors.add("star", format!("\"{value}\" is not a valid star value."));
                }
                star
            },
        };

        let movie = match payload.movie {
            None => {
                errors.add("movie", "This field is required.");
                None
            },
            Some(id) => {
                let movie = catalog::find_published_movie(&self.db, id).await?;
                if movie.is_none() {
                    errors.add("movie", format!("Invalid pk \"{id}\" - object does not exist."));
                }
                movie
            },
        };

        errors.into_result()?;
        let (Some(star), Some(movie)) = (star, movie) else {
            return Err(anyhow::anyhow!("rating payload passed validation with missing fields").into());
        };

        let model = rating::ActiveModel {
            id: Default::default(),
            ip: Set(ip.to_string()),
            star_id: Set(star.id),
            movie_id: Set(movie.id),
        };

        rating::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([rating::Column::Ip, rating::Column::MovieId])
                    .update_column(rating::Column::StarId)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        info!(ip = %ip, movie_id = movie.id, star = star.value, "rating recorded");
        Ok(RatingView { star: star.value, movie: movie.id })
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, PaginatorTrait, SqlErr};

    use super::*;
    use crate::{
        aggregate,
        testutil::{self, MovieSeed},
    };

    fn vote(movie: i32, star: i16) -> CreateRating {
        CreateRating { star: Some(star), movie: Some(movie) }
    }

    async fn stored(db: &DatabaseConnection, ip: &str, movie_id: i32) -> Vec<rating::Model> {
        rating::Entity::find()
            .filter(rating::Column::Ip.eq(ip))
            .filter(rating::Column::MovieId.eq(movie_id))
            .all(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn second_vote_overwrites_the_first() {
        let state = testutil::state().await;
        let db = &state.db;
        let movie = testutil::movie(db, MovieSeed::new("Twice", 2018)).await;

        state.ratings.upsert_rating("10.0.0.9", vote(movie.id, 2)).await.unwrap();
        let view = state.ratings.upsert_rating("10.0.0.9", vote(movie.id, 5)).await.unwrap();

        assert_eq!(view, RatingView { star: 5, movie: movie.id });
        let rows = stored(db, "10.0.0.9", movie.id).await;
        assert_eq!(rows.len(), 1);
        let star = rating_star::Entity::find_by_id(rows[0].star_id).one(db).await.unwrap().unwrap();
        assert_eq!(star.value, 5);
    }

    #[tokio::test]
    async fn different_viewers_keep_separate_rows() {
        let state = testutil::state().await;
        let db = &state.db;
        let movie = testutil::movie(db, MovieSeed::new("Crowd", 2018)).await;

        state.ratings.upsert_rating("10.0.0.1", vote(movie.id, 1)).await.unwrap();
        state.ratings.upsert_rating("10.0.0.2", vote(movie.id, 3)).await.unwrap();

        assert_eq!(rating::Entity::find().count(db).await.unwrap(), 2);
        let stats = aggregate::movie_stats(db, &[movie.id], Some("10.0.0.1")).await.unwrap();
        assert_eq!(stats[&movie.id].middle_star, Some(2.0));
    }

    #[tokio::test]
    async fn rating_user_flips_after_upsert() {
        let state = testutil::state().await;
        let db = &state.db;
        let movie = testutil::movie(db, MovieSeed::new("Flag", 2019)).await;

        let before = aggregate::movie_stats(db, &[movie.id], Some("172.16.0.4")).await.unwrap();
        assert!(!before[&movie.id].rating_user);

        state.ratings.upsert_rating("172.16.0.4", vote(movie.id, 4)).await.unwrap();

        let mine = aggregate::movie_stats(db, &[movie.id], Some("172.16.0.4")).await.unwrap();
        let theirs = aggregate::movie_stats(db, &[movie.id], Some("172.16.0.5")).await.unwrap();
        assert!(mine[&movie.id].rating_user);
        assert!(!theirs[&movie.id].rating_user);
    }

    #[tokio::test]
    async fn interleaved_votes_leave_one_row() {
        let state = testutil::state().await;
        let movie = testutil::movie(&state.db, MovieSeed::new("Race", 2019)).await;

        let votes = (1..=5).map(|star| state.ratings.upsert_rating("8.8.8.8", vote(movie.id, star)));
        for result in futures::future::join_all(votes).await {
            result.unwrap();
        }

        assert_eq!(stored(&state.db, "8.8.8.8", movie.id).await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_ip_and_movie_row_is_refused() {
        let state = testutil::state().await;
        let db = &state.db;
        let movie = testutil::movie(db, MovieSeed::new("Unique", 2019)).await;
        testutil::rate(db, "7.7.7.7", movie.id, 3).await;

        let star = rating_star::Entity::find()
            .filter(rating_star::Column::Value.eq(4))
            .one(db)
            .await
            .unwrap()
            .unwrap();
        let duplicate = rating::ActiveModel {
            id: Default::default(),
            ip: Set("7.7.7.7".to_string()),
            star_id: Set(star.id),
            movie_id: Set(movie.id),
        }
        .insert(db)
        .await;

        let err = duplicate.unwrap_err();
        assert!(matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))), "{err}");
        assert_eq!(stored(db, "7.7.7.7", movie.id).await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_star_and_movie_are_rejected() {
        let state = testutil::state().await;
        let draft = testutil::movie(&state.db, MovieSeed::new("Draft", 2019).draft()).await;

        let Err(AppError::Validation(errors)) =
            state.ratings.upsert_rating("1.2.3.4", vote(draft.id, 9)).await
        else {
            panic!("expected validation error");
        };
        assert!(errors.get("star").is_some());
        assert!(errors.get("movie").is_some());

        let Err(AppError::Validation(errors)) =
            state.ratings.upsert_rating("1.2.3.4", CreateRating::default()).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("star").map(<[String]>::len), Some(1));
        assert_eq!(errors.get("movie").map(<[String]>::len), Some(1));
        assert_eq!(rating::Entity::find().count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn blank_ip_is_rejected() {
        let state = testutil::state().await;
        let movie = testutil::movie(&state.db, MovieSeed::new("Nobody", 2019)).await;

        assert!(matches!(
            state.ratings.upsert_rating("  ", vote(movie.id, 3)).await,
            Err(AppError::Validation(_))
        ));
    }
}
