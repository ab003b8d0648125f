//! Entities and their in-memory repositories.

use chrono::NaiveDate;
use parking_lot::RwLock;
use pylon_core::{ErrorKind, PylonError, PylonResult};
use std::collections::BTreeMap;

use crate::password::PasswordHash;

/// A catalogued artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Identifier, assigned on creation starting at 1.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// Identifier, assigned on creation starting at 1.
    pub id: u32,
    /// Normalized (trimmed, lowercase) email.
    pub email: String,
    /// Salted password digest.
    pub password: PasswordHash,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// E.164 phone number, if given.
    pub phone: Option<String>,
    /// Date of birth, if given.
    pub birth_date: Option<NaiveDate>,
}

/// Fields of an account before it is stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email.
    pub email: String,
    /// Salted password digest.
    pub password: PasswordHash,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// E.164 phone number, if given.
    pub phone: Option<String>,
    /// Date of birth, if given.
    pub birth_date: Option<NaiveDate>,
}

/// Storage for artists.
pub trait ArtistRepository: Send + Sync + 'static {
    /// Stores a new artist and returns it with its id.
    fn create(&self, name: &str) -> PylonResult<Artist>;

    /// Looks an artist up by id.
    fn get(&self, id: u32) -> PylonResult<Option<Artist>>;

    /// Removes an artist. Removing an unknown id is not an error.
    fn delete(&self, id: u32) -> PylonResult<()>;
}

/// Storage for accounts.
pub trait UserRepository: Send + Sync + 'static {
    /// Looks an account up by normalized email.
    fn find_by_email(&self, email: &str) -> PylonResult<Option<User>>;

    /// Stores a new account.
    ///
    /// Fails with `UserAlreadyExists` if the email is taken.
    fn create(&self, user: NewUser) -> PylonResult<User>;
}

#[derive(Debug)]
struct Table<T> {
    next_id: u32,
    rows: BTreeMap<u32, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> PylonResult<u32> {
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| PylonError::with_detail(ErrorKind::Database, "id space exhausted"))?;
        Ok(self.next_id)
    }
}

/// [`ArtistRepository`] backed by a locked map.
#[derive(Debug, Default)]
pub struct InMemoryArtists {
    table: RwLock<Table<Artist>>,
}

impl InMemoryArtists {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artists.
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    /// Returns `true` if no artist is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtistRepository for InMemoryArtists {
    fn create(&self, name: &str) -> PylonResult<Artist> {
        let mut table = self.table.write();
        let artist = Artist {
            id: table.allocate()?,
            name: name.to_string(),
        };
        table.rows.insert(artist.id, artist.clone());
        Ok(artist)
    }

    fn get(&self, id: u32) -> PylonResult<Option<Artist>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    fn delete(&self, id: u32) -> PylonResult<()> {
        self.table.write().rows.remove(&id);
        Ok(())
    }
}

/// [`UserRepository`] backed by a locked map.
#[derive(Debug, Default)]
pub struct InMemoryUsers {
    table: RwLock<Table<User>>,
}

impl InMemoryUsers {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUsers {
    fn find_by_email(&self, email: &str) -> PylonResult<Option<User>> {
        Ok(self
            .table
            .read()
            .rows
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn create(&self, user: NewUser) -> PylonResult<User> {
        let mut table = self.table.write();
        if table.rows.values().any(|existing| existing.email == user.email) {
            return Err(PylonError::new(ErrorKind::UserAlreadyExists));
        }

        let user = User {
            id: table.allocate()?,
            email: user.email,
            password: user.password,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            birth_date: user.birth_date,
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: PasswordHash::generate("correct horse"),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            birth_date: None,
        }
    }

    #[test]
    fn test_artist_ids_start_at_one() {
        let repo = InMemoryArtists::new();
        assert_eq!(repo.create("Nina Simone").unwrap().id, 1);
        assert_eq!(repo.create("Miles Davis").unwrap().id, 2);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_artist_get_and_delete() {
        let repo = InMemoryArtists::new();
        let artist = repo.create("Nina Simone").unwrap();
        assert_eq!(repo.get(artist.id).unwrap(), Some(artist.clone()));

        repo.delete(artist.id).unwrap();
        assert_eq!(repo.get(artist.id).unwrap(), None);
        assert!(repo.delete(artist.id).is_ok());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let repo = InMemoryUsers::new();
        repo.create(new_user("jane@example.com")).unwrap();
        let err = repo.create(new_user("jane@example.com")).unwrap_err();
        assert!(err.is(ErrorKind::UserAlreadyExists));
    }

    #[test]
    fn test_find_by_email() {
        let repo = InMemoryUsers::new();
        let created = repo.create(new_user("jane@example.com")).unwrap();
        let found = repo.find_by_email("jane@example.com").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_email("john@example.com").unwrap().is_none());
    }
}
