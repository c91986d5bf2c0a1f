use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::{
    AppState,
    config::Config,
    db,
    entities::{
        actor, category, genre, movie, movie_actor, movie_director, movie_genre, movie_shot,
        rating, rating_star, review,
    },
};

pub async fn memory_db() -> DatabaseConnection {
    db::connect_and_migrate("sqlite::memory:").await.expect("in-memory database")
}

pub async fn state() -> Arc<AppState> {
    state_with(Config::default()).await
}

pub async fn state_with(config: Config) -> Arc<AppState> {
    let db = memory_db().await;
    Arc::new(AppState::new(db, config))
}

pub async fn category(db: &DatabaseConnection, name: &str) -> category::Model {
    category::ActiveModel {
        id: Default::default(),
        name: Set(name.to_string()),
        description: Set(format!("{name} movies")),
        url: Set(slug(name)),
    }
    .insert(db)
    .await
    .expect("insert category")
}

pub async fn genre(db: &DatabaseConnection, name: &str) -> genre::Model {
    genre::ActiveModel {
        id: Default::default(),
        name: Set(name.to_string()),
        description: Set(String::new()),
        url: Set(slug(name)),
    }
    .insert(db)
    .await
    .expect("insert genre")
}

pub async fn actor(db: &DatabaseConnection, name: &str, age: i16) -> actor::Model {
    actor::ActiveModel {
        id: Default::default(),
        name: Set(name.to_string()),
        age: Set(age),
        description: Set(format!("About {name}")),
        image: Set(format!("actors/{}.jpg", slug(name))),
    }
    .insert(db)
    .await
    .expect("insert actor")
}

pub struct MovieSeed<'a> {
    pub title: &'a str,
    pub year: i16,
    pub draft: bool,
    pub category_id: Option<i32>,
}

impl<'a> MovieSeed<'a> {
    pub fn new(title: &'a str, year: i16) -> Self {
        Self { title, year, draft: false, category_id: None }
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn category(mut self, id: i32) -> Self {
        self.category_id = Some(id);
        self
    }
}

pub async fn movie(db: &DatabaseConnection, seed: MovieSeed<'_>) -> movie::Model {
    movie::ActiveModel {
        id: Default::default(),
        title: Set(seed.title.to_string()),
        tagline: Set(format!("{} tagline", seed.title)),
        description: Set(String::new()),
        poster: Set(format!("movies/{}.jpg", slug(seed.title))),
        year: Set(seed.year),
        country: Set("USA".to_string()),
        world_premiere: Set(format!("{}-06-01", seed.year)),
        budget: Set(1_000_000),
        fees_in_usa: Set(0),
        fees_in_world: Set(0),
        category_id: Set(seed.category_id),
        url: Set(slug(seed.title)),
        draft: Set(seed.draft),
    }
    .insert(db)
    .await
    .expect("insert movie")
}

pub async fn tag(db: &DatabaseConnection, movie_id: i32, genre_id: i32) {
    movie_genre::Entity::insert(movie_genre::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(genre_id),
    })
    .exec_without_returning(db)
    .await
    .expect("tag genre");
}

pub async fn cast(db: &DatabaseConnection, movie_id: i32, actor_id: i32) {
    movie_actor::Entity::insert(movie_actor::ActiveModel {
        movie_id: Set(movie_id),
        actor_id: Set(actor_id),
    })
    .exec_without_returning(db)
    .await
    .expect("cast actor");
}

pub async fn direct(db: &DatabaseConnection, movie_id: i32, actor_id: i32) {
    movie_director::Entity::insert(movie_director::ActiveModel {
        movie_id: Set(movie_id),
        actor_id: Set(actor_id),
    })
    .exec_without_returning(db)
    .await
    .expect("credit director");
}

pub async fn shot(db: &DatabaseConnection, movie_id: i32, title: &str) -> movie_shot::Model {
    movie_shot::ActiveModel {
        id: Default::default(),
        title: Set(title.to_string()),
        description: Set(String::new()),
        image: Set(format!("shots/{}.jpg", slug(title))),
        movie_id: Set(movie_id),
    }
    .insert(db)
    .await
    .expect("insert shot")
}

/// Inserts a review directly, bypassing validation.
pub async fn review(
    db: &DatabaseConnection,
    movie_id: i32,
    parent_id: Option<i32>,
    name: &str,
) -> review::Model {
    review::ActiveModel {
        id: Default::default(),
        email: Set(format!("{}@example.com", slug(name))),
        name: Set(name.to_string()),
        text: Set(format!("{name} says hi")),
        parent_id: Set(parent_id),
        movie_id: Set(movie_id),
    }
    .insert(db)
    .await
    .expect("insert review")
}

/// Inserts a rating directly, bypassing the upsert path.
pub async fn rate(db: &DatabaseConnection, ip: &str, movie_id: i32, value: i16) {
    let star = rating_star::Entity::find()
        .filter(rating_star::Column::Value.eq(value))
        .one(db)
        .await
        .expect("query star")
        .expect("seeded star");
    rating::ActiveModel {
        id: Default::default(),
        ip: Set(ip.to_string()),
        star_id: Set(star.id),
        movie_id: Set(movie_id),
    }
    .insert(db)
    .await
    .expect("insert rating");
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
