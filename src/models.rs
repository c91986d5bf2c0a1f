use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::entities::{actor, movie, movie_shot, review};

#[derive(Clone, Debug, Serialize)]
pub struct MovieListItem {
    pub id: i32,
    pub title: String,
    pub tagline: String,
    pub category: Option<String>,
    pub middle_star: Option<f64>,
    pub rating_user: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    pub tagline: String,
    pub description: String,
    pub poster: String,
    pub year: i16,
    pub country: String,
    pub world_premiere: Option<Date>,
    pub budget: i64,
    pub fees_in_usa: i64,
    pub fees_in_world: i64,
    pub url: String,
    pub category: Option<String>,
    pub directors: Vec<String>,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
    pub movie_shots: Vec<MovieShotItem>,
    pub reviews: Vec<ReviewNode>,
    pub middle_star: Option<f64>,
    pub rating_user: bool,
}

impl MovieDetail {
    /// Scalar fields of the movie; related collections start empty. `draft` is never copied.
    pub fn from_movie(movie: movie::Model, category: Option<String>) -> Self {
        let world_premiere = match movie.world_premiere.parse() {
            Ok(date) => Some(date),
            Err(err) => {
                tracing::warn!(movie_id = movie.id, raw = %movie.world_premiere, error = %err, "unparsable world premiere date");
                None
            },
        };

        Self {
            id: movie.id,
            title: movie.title,
            tagline: movie.tagline,
            description: movie.description,
            poster: movie.poster,
            year: movie.year,
            country: movie.country,
            world_premiere,
            budget: movie.budget,
            fees_in_usa: movie.fees_in_usa,
            fees_in_world: movie.fees_in_world,
            url: movie.url,
            category,
            directors: Vec::new(),
            actors: Vec::new(),
            genres: Vec::new(),
            movie_shots: Vec::new(),
            reviews: Vec::new(),
            middle_star: None,
            rating_user: false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieShotItem {
    pub title: String,
    pub description: String,
    pub image: String,
}

impl From<movie_shot::Model> for MovieShotItem {
    fn from(shot: movie_shot::Model) -> Self {
        Self { title: shot.title, description: shot.description, image: shot.image }
    }
}

/// A review with its replies nested below it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewNode {
    pub id: i32,
    pub name: String,
    pub text: String,
    pub children: Vec<ReviewNode>,
    /// Set when replies exist below the depth limit and were not emitted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActorListItem {
    pub id: i32,
    pub name: String,
    pub image: String,
}

impl From<actor::Model> for ActorListItem {
    fn from(actor: actor::Model) -> Self {
        Self { id: actor.id, name: actor.name, image: actor.image }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ActorDetail {
    pub id: i32,
    pub name: String,
    pub age: i16,
    pub description: String,
    pub image: String,
}

impl From<actor::Model> for ActorDetail {
    fn from(actor: actor::Model) -> Self {
        Self {
            id: actor.id,
            name: actor.name,
            age: actor.age,
            description: actor.description,
            image: actor.image,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub genres: Option<String>,
    pub year_min: Option<String>,
    pub year_max: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateReview {
    pub email: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub movie: Option<i32>,
    pub parent: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReviewView {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub text: String,
    pub movie: i32,
    pub parent: Option<i32>,
}

impl From<review::Model> for ReviewView {
    fn from(review: review::Model) -> Self {
        Self {
            id: review.id,
            email: review.email,
            name: review.name,
            text: review.text,
            movie: review.movie_id,
            parent: review.parent_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRating {
    pub star: Option<i16>,
    pub movie: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RatingView {
    pub star: i16,
    pub movie: i32,
}
