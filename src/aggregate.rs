use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType, QueryFilter, QuerySelect,
    RelationTrait,
    sea_query::{Expr, Func, SimpleExpr},
};
use tracing::debug;

use crate::{
    entities::{rating, rating_star},
    error::AppResult,
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovieStats {
    /// Mean star value, `None` when the movie has no ratings.
    pub middle_star: Option<f64>,
    /// Whether the requesting viewer has rated the movie.
    pub rating_user: bool,
}

#[derive(Debug, FromQueryResult)]
struct StatsRow {
    movie_id: i32,
    star_total: i64,
    star_count: i64,
    viewer_votes: i64,
}

/// Rating stats for every id in `movie_ids`, computed in a single grouped query.
///
/// Movies without ratings are present in the result with [`MovieStats::default`].
pub async fn movie_stats<C: ConnectionTrait>(
    db: &C,
    movie_ids: &[i32],
    viewer_ip: Option<&str>,
) -> AppResult<HashMap<i32, MovieStats>> {
    if movie_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let viewer_vote: SimpleExpr = match viewer_ip {
        Some(ip) => Expr::case(Expr::col((rating::Entity, rating::Column::Ip)).eq(ip), 1)
            .finally(0)
            .into(),
        None => Expr::value(0),
    };

    let rows = rating::Entity::find()
        .select_only()
        .column(rating::Column::MovieId)
        .column_as(Expr::col((rating_star::Entity, rating_star::Column::Value)).sum(), "star_total")
        .column_as(Expr::col((rating::Entity, rating::Column::Id)).count(), "star_count")
        .column_as(SimpleExpr::from(Func::sum(viewer_vote)), "viewer_votes")
        .join(JoinType::InnerJoin, rating::Relation::Star.def())
        .filter(rating::Column::MovieId.is_in(movie_ids.iter().copied()))
        .group_by(rating::Column::MovieId)
        .into_model::<StatsRow>()
        .all(db)
        .await?;

    debug!(movies = movie_ids.len(), rated = rows.len(), "aggregated ratings");

    let mut stats: HashMap<i32, MovieStats> =
        movie_ids.iter().map(|id| (*id, MovieStats::default())).collect();
    for row in rows {
        stats.insert(
            row.movie_id,
            MovieStats {
                middle_star: mean(row.star_total, row.star_count),
                rating_user: row.viewer_votes > 0,
            },
        );
    }

    Ok(stats)
}

fn mean(total: i64, count: i64) -> Option<f64> {
    (count > 0).then(|| total as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, MovieSeed};

    #[test]
    fn mean_never_divides_by_zero() {
        assert_eq!(mean(0, 0), None);
        assert_eq!(mean(9, 2), Some(4.5));
    }

    #[tokio::test]
    async fn unrated_movie_has_no_middle_star() {
        let db = testutil::memory_db().await;
        let movie = testutil::movie(&db, MovieSeed::new("Quiet Film", 2001)).await;

        let stats = movie_stats(&db, &[movie.id], Some("10.0.0.1")).await.unwrap();

        assert_eq!(stats[&movie.id], MovieStats { middle_star: None, rating_user: false });
    }

    #[tokio::test]
    async fn middle_star_is_the_mean_per_movie() {
        let db = testutil::memory_db().await;
        let first = testutil::movie(&db, MovieSeed::new("First", 2001)).await;
        let second = testutil::movie(&db, MovieSeed::new("Second", 2002)).await;
        testutil::rate(&db, "10.0.0.1", first.id, 5).await;
        testutil::rate(&db, "10.0.0.2", first.id, 2).await;
        testutil::rate(&db, "10.0.0.3", first.id, 4).await;
        testutil::rate(&db, "10.0.0.1", second.id, 1).await;

        let stats = movie_stats(&db, &[first.id, second.id], None).await.unwrap();

        let first_mean = stats[&first.id].middle_star.unwrap();
        assert!((first_mean - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats[&second.id].middle_star, Some(1.0));
    }

    #[tokio::test]
    async fn rating_user_is_scoped_to_the_viewer() {
        let db = testutil::memory_db().await;
        let movie = testutil::movie(&db, MovieSeed::new("Scoped", 2005)).await;
        let other = testutil::movie(&db, MovieSeed::new("Other", 2005)).await;
        testutil::rate(&db, "192.168.1.7", movie.id, 3).await;
        testutil::rate(&db, "192.168.1.8", other.id, 3).await;

        let mine = movie_stats(&db, &[movie.id, other.id], Some("192.168.1.7")).await.unwrap();
        assert!(mine[&movie.id].rating_user);
        assert!(!mine[&other.id].rating_user);

        let anonymous = movie_stats(&db, &[movie.id], None).await.unwrap();
        assert!(!anonymous[&movie.id].rating_user);
    }

    #[tokio::test]
    async fn empty_id_list_skips_the_query() {
        let db = testutil::memory_db().await;
        assert!(movie_stats(&db, &[], Some("1.1.1.1")).await.unwrap().is_empty());
    }
}
