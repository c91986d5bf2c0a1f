use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, warn};

use crate::{
    catalog,
    entities::review,
    error::{AppResult, FieldErrors},
    models::{CreateReview, ReviewNode},
};

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";
const EMAIL_MAX: usize = 254;
const NAME_MAX: usize = 100;
const TEXT_MAX: usize = 5000;

#[derive(Clone)]
pub struct ReviewStore {
    db: DatabaseConnection,
    max_depth: usize,
}

impl ReviewStore {
    pub fn new(db: DatabaseConnection, max_depth: usize) -> Self {
        Self { db, max_depth: max_depth.max(1) }
    }

    /// Threaded reviews of a movie, loaded with one query.
    pub async fn forest(&self, movie_id: i32) -> AppResult<Vec<ReviewNode>> {
        let reviews = review::Entity::find()
            .filter(review::Column::MovieId.eq(movie_id))
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await?;

        debug!(movie_id, reviews = reviews.len(), "building review forest");
        Ok(build_forest(reviews, self.max_depth))
    }

    pub async fn create(&self, payload: CreateReview) -> AppResult<review::Model> {
        let mut errors = FieldErrors::new();

        let email = required_text(&mut errors, "email", payload.email, EMAIL_MAX);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }
        let name = required_text(&mut errors, "name", payload.name, NAME_MAX);
        let text = required_text(&mut errors, "text", payload.text, TEXT_MAX);

        let movie = match payload.movie {
            None => {
                errors.add("movie", REQUIRED);
                None
            },
            Some(id) => {
                let movie = catalog::find_published_movie(&self.db, id).await?;
                if movie.is_none() {
                    errors.add("movie", does_not_exist(id));
                }
                movie
            },
        };

        if let Some(parent_id) = payload.parent {
            match review::Entity::find_by_id(parent_id).one(&self.db).await? {
                None => errors.add("parent", does_not_exist(parent_id)),
                Some(parent) => {
                    if movie.as_ref().is_some_and(|m| m.id != parent.movie_id) {
                        errors.add("parent", "Parent review belongs to a different movie.");
                    }
                },
            }
        }

        errors.into_result()?;
        let (Some(email), Some(name), Some(text), Some(movie)) = (email, name, text, movie) else {
            return Err(anyhow::anyhow!("review payload passed validation with missing fields").into());
        };

        let created = review::ActiveModel {
            id: Default::default(),
            email: Set(email),
            name: Set(name),
            text: Set(text),
            parent_id: Set(payload.parent),
            movie_id: Set(movie.id),
        }
        .insert(&self.db)
        .await?;

        info!(review_id = created.id, movie_id = created.movie_id, parent_id = ?created.parent_id, "review created");
        Ok(created)
    }
}

/// Turns a movie's flat review list into root nodes with nested replies.
///
/// Reviews are grouped by parent once; expanding a node takes its replies out of that map,
/// so every review is emitted at most once. Nodes at `max_depth` that still have replies are
/// emitted with no children and `truncated` set.
pub fn build_forest(reviews: Vec<review::Model>, max_depth: usize) -> Vec<ReviewNode> {
    let known: HashSet<i32> = reviews.iter().map(|r| r.id).collect();

    let mut by_parent: HashMap<Option<i32>, Vec<review::Model>> = HashMap::new();
    for review in reviews {
        match review.parent_id {
            Some(parent) if !known.contains(&parent) => {
                debug!(review_id = review.id, parent_id = parent, "reply to a review of another movie");
            },
            _ => by_parent.entry(review.parent_id).or_default().push(review),
        }
    }

    let roots = by_parent.remove(&None).unwrap_or_default();
    roots.into_iter().map(|root| expand(root, &mut by_parent, 1, max_depth.max(1))).collect()
}

fn expand(
    review: review::Model,
    by_parent: &mut HashMap<Option<i32>, Vec<review::Model>>,
    depth: usize,
    max_depth: usize,
) -> ReviewNode {
    let replies = by_parent.remove(&Some(review.id)).unwrap_or_default();
    let mut node = ReviewNode {
        id: review.id,
        name: review.name,
        text: review.text,
        children: Vec::new(),
        truncated: false,
    };

    if depth >= max_depth {
        if !replies.is_empty() {
            warn!(review_id = node.id, depth, hidden = replies.len(), "review thread truncated");
            node.truncated = true;
        }
        return node;
    }

    node.children =
        replies.into_iter().map(|reply| expand(reply, by_parent, depth + 1, max_depth)).collect();
    node
}

fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_chars: usize,
) -> Option<String> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    if value.trim().is_empty() {
        errors.add(field, BLANK);
        return None;
    }
    if value.chars().count() > max_chars {
        errors.add(field, format!("Ensure this field has no more than {max_chars} characters."));
        return None;
    }
    Some(value)
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn does_not_exist(id: i32) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}
