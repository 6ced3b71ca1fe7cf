//! Movie and actor catalog
//!
//! The protected resource behind the auth core. Held in memory; a movie
//! stores the ids of its cast and resolves them on read, so renaming an
//! actor shows up in every movie and deleting one removes it from every cast.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

pub type ActorId = i64;
pub type MovieId = i64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Actor not found for id: {0}")]
    ActorNotFound(ActorId),

    #[error("Movie not found for id: {0}")]
    MovieNotFound(MovieId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub director: String,
    pub year: i32,
    pub actors: Vec<Actor>,
}

/// Body of actor create/update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRequest {
    pub name: String,
}

/// Body of movie create/update requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRequest {
    pub title: String,
    pub director: String,
    pub year: i32,
    /// Cast, by actor id
    #[serde(default)]
    pub actor_ids: Vec<ActorId>,
}

#[derive(Debug, Clone)]
struct MovieRecord {
    id: MovieId,
    title: String,
    director: String,
    year: i32,
    actor_ids: Vec<ActorId>,
}

#[derive(Debug, Default)]
struct Tables {
    actors: BTreeMap<ActorId, Actor>,
    movies: BTreeMap<MovieId, MovieRecord>,
    last_actor_id: ActorId,
    last_movie_id: MovieId,
}

impl Tables {
    fn resolve(&self, record: &MovieRecord) -> Movie {
        Movie {
            id: record.id,
            title: record.title.clone(),
            director: record.director.clone(),
            year: record.year,
            actors: record
                .actor_ids
                .iter()
                .filter_map(|id| self.actors.get(id).cloned())
                .collect(),
        }
    }

    fn check_cast(&self, actor_ids: &[ActorId]) -> Result<(), CatalogError> {
        match actor_ids.iter().find(|id| !self.actors.contains_key(id)) {
            Some(&missing) => Err(CatalogError::ActorNotFound(missing)),
            None => Ok(()),
        }
    }

    fn insert_actor(&mut self, name: String) -> Actor {
        self.last_actor_id += 1;
        let actor = Actor {
            id: self.last_actor_id,
            name,
        };
        self.actors.insert(actor.id, actor.clone());
        actor
    }

    fn insert_movie(&mut self, request: MovieRequest) -> Movie {
        self.last_movie_id += 1;
        let record = MovieRecord {
            id: self.last_movie_id,
            title: request.title,
            director: request.director,
            year: request.year,
            actor_ids: request.actor_ids,
        };
        let movie = self.resolve(&record);
        self.movies.insert(record.id, record);
        movie
    }
}

/// In-memory movie/actor service
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<Tables>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load demo data: two actors and one movie for each
    pub async fn seed(&self) {
        let mut tables = self.tables.write().await;

        let brad = tables.insert_actor("Brad Pitt".to_string());
        let tom = tables.insert_actor("Tom Cruise".to_string());

        tables.insert_movie(MovieRequest {
            title: "Fight Club".to_string(),
            director: "David Fincher".to_string(),
            year: 1999,
            actor_ids: vec![brad.id],
        });
        tables.insert_movie(MovieRequest {
            title: "Top Gun".to_string(),
            director: "Tony Scott".to_string(),
            year: 1986,
            actor_ids: vec![tom.id],
        });

        tracing::info!(
            actors = tables.actors.len(),
            movies = tables.movies.len(),
            "Seeded demo catalog"
        );
    }

    // Actors

    pub async fn list_actors(&self) -> Vec<Actor> {
        self.tables.read().await.actors.values().cloned().collect()
    }

    pub async fn get_actor(&self, id: ActorId) -> Result<Actor, CatalogError> {
        self.tables
            .read()
            .await
            .actors
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ActorNotFound(id))
    }

    pub async fn create_actor(&self, request: ActorRequest) -> Actor {
        self.tables.write().await.insert_actor(request.name)
    }

    pub async fn update_actor(
        &self,
        id: ActorId,
        request: ActorRequest,
    ) -> Result<Actor, CatalogError> {
        let mut tables = self.tables.write().await;
        let actor = tables
            .actors
            .get_mut(&id)
            .ok_or(CatalogError::ActorNotFound(id))?;
        actor.name = request.name;
        Ok(actor.clone())
    }

    /// Delete an actor and remove it from every cast
    pub async fn delete_actor(&self, id: ActorId) -> Result<(), CatalogError> {
        let mut tables = self.tables.write().await;
        tables
            .actors
            .remove(&id)
            .ok_or(CatalogError::ActorNotFound(id))?;

        for movie in tables.movies.values_mut() {
            movie.actor_ids.retain(|&actor_id| actor_id != id);
        }
        Ok(())
    }

    // Movies

    pub async fn list_movies(&self) -> Vec<Movie> {
        let tables = self.tables.read().await;
        tables
            .movies
            .values()
            .map(|record| tables.resolve(record))
            .collect()
    }

    pub async fn get_movie(&self, id: MovieId) -> Result<Movie, CatalogError> {
        let tables = self.tables.read().await;
        tables
            .movies
            .get(&id)
            .map(|record| tables.resolve(record))
            .ok_or(CatalogError::MovieNotFound(id))
    }

    pub async fn create_movie(&self, request: MovieRequest) -> Result<Movie, CatalogError> {
        let mut tables = self.tables.write().await;
        tables.check_cast(&request.actor_ids)?;
        Ok(tables.insert_movie(request))
    }

    pub async fn update_movie(
        &self,
        id: MovieId,
        request: MovieRequest,
    ) -> Result<Movie, CatalogError> {
        let mut tables = self.tables.write().await;
        if !tables.movies.contains_key(&id) {
            return Err(CatalogError::MovieNotFound(id));
        }
        tables.check_cast(&request.actor_ids)?;

        let record = MovieRecord {
            id,
            title: request.title,
            director: request.director,
            year: request.year,
            actor_ids: request.actor_ids,
        };
        let movie = tables.resolve(&record);
        tables.movies.insert(id, record);
        Ok(movie)
    }

    pub async fn delete_movie(&self, id: MovieId) -> Result<(), CatalogError> {
        self.tables
            .write()
            .await
            .movies
            .remove(&id)
            .map(|_| ())
            .ok_or(CatalogError::MovieNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> Catalog {
        let catalog = Catalog::new();
        catalog.seed().await;
        catalog
    }

    #[tokio::test]
    async fn test_seed() {
        let catalog = seeded().await;

        let actors = catalog.list_actors().await;
        assert_eq!(
            actors,
            vec![
                Actor {
                    id: 1,
                    name: "Brad Pitt".to_string()
                },
                Actor {
                    id: 2,
                    name: "Tom Cruise".to_string()
                },
            ]
        );

        let movies = catalog.list_movies().await;
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Fight Club");
        assert_eq!(movies[0].actors, vec![actors[0].clone()]);
        assert_eq!(movies[1].title, "Top Gun");
    }

    #[tokio::test]
    async fn test_delete_actor_removes_from_casts() {
        let catalog = seeded().await;

        catalog.delete_actor(1).await.unwrap();

        assert_eq!(
            catalog.get_actor(1).await,
            Err(CatalogError::ActorNotFound(1))
        );
        assert!(catalog.get_movie(1).await.unwrap().actors.is_empty());
        assert_eq!(catalog.get_movie(2).await.unwrap().actors.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let catalog = seeded().await;

        let err = catalog.delete_actor(100).await.unwrap_err();
        assert_eq!(err.to_string(), "Actor not found for id: 100");

        let err = catalog.get_movie(100).await.unwrap_err();
        assert_eq!(err.to_string(), "Movie not found for id: 100");

        assert_eq!(
            catalog
                .update_actor(
                    100,
                    ActorRequest {
                        name: "Nobody".to_string()
                    }
                )
                .await,
            Err(CatalogError::ActorNotFound(100))
        );
        assert_eq!(
            catalog.delete_movie(100).await,
            Err(CatalogError::MovieNotFound(100))
        );
    }

    #[tokio::test]
    async fn test_create_and_update_movie() {
        let catalog = Catalog::new();
        let actor = catalog
            .create_actor(ActorRequest {
                name: "Owen Wilson".to_string(),
            })
            .await;

        let movie = catalog
            .create_movie(MovieRequest {
                title: "Cars".to_string(),
                director: "John Lasseter".to_string(),
                year: 2006,
                actor_ids: vec![],
            })
            .await
            .unwrap();
        assert_eq!(movie.id, 1);
        assert!(movie.actors.is_empty());

        let updated = catalog
            .update_movie(
                movie.id,
                MovieRequest {
                    title: "Cars".to_string(),
                    director: "John Lasseter".to_string(),
                    year: 2006,
                    actor_ids: vec![actor.id],
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.actors, vec![actor]);

        let unknown_cast = catalog
            .create_movie(MovieRequest {
                title: "Cars 2".to_string(),
                director: "John Lasseter".to_string(),
                year: 2011,
                actor_ids: vec![42],
            })
            .await;
        assert_eq!(unknown_cast, Err(CatalogError::ActorNotFound(42)));
    }

    #[test]
    fn test_movie_request_defaults_cast() {
        let request: MovieRequest =
            serde_json::from_str(r#"{"title":"Cars","director":"John Lasseter","year":2006}"#)
                .unwrap();
        assert!(request.actor_ids.is_empty());
    }
}
