use std::{io, path::PathBuf};

use parking_lot::RwLock;

use crate::api::AuthToken;

/// Holds the session key, optionally mirrored to a file so that it survives restarts
#[derive(Debug, Default)]
pub struct TokenStore {
    cached: RwLock<Option<AuthToken>>,
    file: Option<PathBuf>,
}

impl TokenStore {
    pub fn in_memory(token: Option<AuthToken>) -> TokenStore {
        TokenStore {
            cached: RwLock::new(token),
            file: None,
        }
    }

    /// Reads the token saved in `file`, if any. A missing or blank file means no token.
    pub fn from_file(file: PathBuf) -> io::Result<TokenStore> {
        let token = match std::fs::read_to_string(&file) {
            Ok(contents) => Some(contents.trim().to_string())
                .filter(|t| !t.is_empty())
                .map(AuthToken),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(TokenStore {
            cached: RwLock::new(token),
            file: Some(file),
        })
    }

    pub fn get(&self) -> Option<AuthToken> {
        self.cached.read().clone()
    }

    /// The in-memory token is updated even if saving it to the file fails
    pub fn set(&self, token: AuthToken) -> io::Result<()> {
        let contents = token.0.clone();
        *self.cached.write() = Some(token);
        match &self.file {
            Some(file) => std::fs::write(file, contents),
            None => Ok(()),
        }
    }

    pub fn clear(&self) -> io::Result<()> {
        *self.cached.write() = None;
        match &self.file {
            Some(file) => match std::fs::remove_file(file) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                res => res,
            },
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().expect("creating tempdir");
        let path = dir.path().join("session");

        let store = TokenStore::from_file(path.clone()).expect("opening missing file");
        assert_eq!(store.get(), None);
        store
            .set(AuthToken(String::from("key-1")))
            .expect("saving token");

        let reopened = TokenStore::from_file(path.clone()).expect("reopening");
        assert_eq!(reopened.get(), Some(AuthToken(String::from("key-1"))));
        reopened.clear().expect("clearing token");
        assert_eq!(reopened.get(), None);
        assert!(!path.exists());
        reopened.clear().expect("clearing twice");
    }

    #[test]
    fn blank_file_is_no_token() {
        let dir = tempfile::tempdir().expect("creating tempdir");
        let path = dir.path().join("session");
        std::fs::write(&path, "  \n").expect("writing file");
        assert_eq!(TokenStore::from_file(path).unwrap().get(), None);
    }
}
