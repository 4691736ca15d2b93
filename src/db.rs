use crate::error::ApiError;
use crate::models::{Book, User};
use anyhow::{bail, Result};
use bcrypt::verify;
use log::warn;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Seeded once at startup, read-only afterwards.
pub struct UserStore {
    users: HashMap<String, User>,
}

impl UserStore {
    pub fn new(seed: Vec<User>) -> Result<Self> {
        let mut users = HashMap::with_capacity(seed.len());
        for user in seed {
            if user.username.is_empty() {
                bail!("seed user with empty username");
            }
            if users.contains_key(&user.username) {
                bail!("duplicate seed user {:?}", user.username);
            }
            users.insert(user.username.clone(), user);
        }
        Ok(Self { users })
    }

    /// Checks a username/password pair. Unknown users and wrong passwords
    /// both give `None`. Runs a bcrypt comparison, so call it off the
    /// async workers.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let user = self.users.get(username)?;
        match verify(password, &user.hashed_password) {
            Ok(true) => Some(user.clone()),
            Ok(false) => None,
            Err(e) => {
                warn!("Stored password hash for {username} is unusable: {e}");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }
}

/// The book collection. It is the only owner of the list, and the write
/// lock covers the duplicate check together with the append.
#[derive(Default)]
pub struct CatalogStore {
    books: RwLock<Vec<Book>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, book: Book) -> Result<Book, ApiError> {
        let mut books = self.books.write().await;
        if books.iter().any(|b| b.id == book.id) {
            return Err(ApiError::Conflict);
        }
        books.push(book.clone());
        Ok(book)
    }

    /// Snapshot in insertion order.
    pub async fn list(&self) -> Vec<Book> {
        self.books.read().await.clone()
    }

    pub async fn get(&self, id: i64) -> Result<Book, ApiError> {
        let books = self.books.read().await;
        books
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bcrypt::hash;

    use super::*;

    fn seed_user(username: &str, password: &str) -> User {
        User {
            username: username.to_owned(),
            full_name: format!("{username} Dev"),
            hashed_password: hash(password, 4).unwrap(),
        }
    }

    fn book(id: i64, title: &str) -> Book {
        Book {
            id,
            title: title.to_owned(),
            author: "J.R.R. Tolkien".to_string(),
            description: String::new(),
            price: 12.99,
        }
    }

    #[test]
    fn test_authenticate() {
        let chinna = seed_user("chinna", "password123");
        let users = UserStore::new(vec![chinna.clone(), seed_user("alice", "wonderland")]).unwrap();
        assert_eq!(users.len(), 2);

        assert_eq!(users.authenticate("chinna", "password123"), Some(chinna));
        assert_eq!(users.authenticate("chinna", "password124"), None);
        assert_eq!(users.authenticate("chinna", ""), None);
        assert_eq!(users.authenticate("alice", "password123"), None);
        assert_eq!(users.authenticate("nobody", "password123"), None);
        assert!(users.authenticate("alice", "wonderland").is_some());
    }

    #[test]
    fn test_authenticate_bad_hash() {
        let mut user = seed_user("chinna", "password123");
        user.hashed_password = "not-a-bcrypt-hash".to_string();
        let users = UserStore::new(vec![user]).unwrap();
        assert_eq!(users.authenticate("chinna", "password123"), None);
    }

    #[test]
    fn test_duplicate_seed() {
        let result = UserStore::new(vec![seed_user("chinna", "a"), seed_user("chinna", "b")]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_insertion_order() {
        let catalog = CatalogStore::new();
        for id in [3, 1, 2] {
            catalog.add(book(id, "Book")).await.unwrap();
        }
        let ids: Vec<i64> = catalog.list().await.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let catalog = CatalogStore::new();
        let hobbit = book(1, "The Hobbit");
        assert_eq!(catalog.add(hobbit.clone()).await.unwrap(), hobbit);

        let result = catalog.add(book(1, "The Silmarillion")).await;
        assert!(matches!(result, Err(ApiError::Conflict)));
        assert_eq!(catalog.list().await, vec![hobbit.clone()]);
        assert_eq!(catalog.get(1).await.unwrap(), hobbit);
    }

    #[tokio::test]
    async fn test_get() {
        let catalog = CatalogStore::new();
        assert!(matches!(catalog.get(1).await, Err(ApiError::NotFound)));

        catalog.add(book(7, "Seven")).await.unwrap();
        catalog.add(book(8, "Eight")).await.unwrap();
        assert_eq!(catalog.get(8).await.unwrap().title, "Eight");
        assert!(matches!(catalog.get(999).await, Err(ApiError::NotFound)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_same_id() {
        let catalog = Arc::new(CatalogStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let catalog = catalog.clone();
            handles.push(tokio::spawn(async move {
                catalog.add(book(i % 4, "Racer")).await.is_ok()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 4);

        let mut ids: Vec<i64> = catalog.list().await.iter().map(|b| b.id).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }
}
