use serde::{Deserialize, Serialize};

use super::{Movie, MovieId, WatchList};

/// The stored user document in the `users` collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDocument {
    pub username: String,
    pub user_id: String,
    pub profile_picture: String,
    pub my_list: WatchList,
}

impl UserDocument {
    /// Document written at registration time
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            user_id: user_id.into(),
            profile_picture: String::new(),
            my_list: WatchList::new(),
        }
    }
}

/// Identity reported by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Bearer token for calls that need the signed-in user's credentials
    #[serde(skip)]
    pub id_token: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            id_token: None,
        }
    }
}

/// The authenticated user as the session sees it: identity metadata merged
/// with the stored document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: Option<String>,
    pub username: String,
    pub profile_picture: String,
    pub my_list: WatchList,
    #[serde(skip)]
    pub id_token: Option<String>,
}

impl User {
    /// Merges identity metadata with the stored document.
    ///
    /// A missing document yields empty defaults. The document's `userId`
    /// wins when present, falling back to the identity's.
    pub fn from_parts(identity: &Identity, document: Option<UserDocument>) -> Self {
        let document = document.unwrap_or_default();
        let user_id = if document.user_id.is_empty() {
            identity.user_id.clone()
        } else {
            document.user_id
        };

        Self {
            user_id,
            email: identity.email.clone(),
            username: document.username,
            profile_picture: document.profile_picture,
            my_list: document.my_list,
            id_token: identity.id_token.clone(),
        }
    }

    /// Refreshes mirrored fields from a re-fetched document.
    ///
    /// Empty `username`/`profilePicture` keep the current value; the list is
    /// always taken from the store.
    pub fn refresh_from(&mut self, document: UserDocument) {
        if !document.username.is_empty() {
            self.username = document.username;
        }
        if !document.profile_picture.is_empty() {
            self.profile_picture = document.profile_picture;
        }
        self.my_list = document.my_list;
    }
}

/// Array operator applied to the `myList` field
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    /// Append each movie whose id is not already present
    Union(Vec<Movie>),
    /// Drop every entry whose id is listed
    Remove(Vec<MovieId>),
}

/// Partial update of a user document. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub profile_picture: Option<String>,
    pub my_list: Option<ListOp>,
}

impl UserPatch {
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    pub fn profile_picture(url: impl Into<String>) -> Self {
        Self {
            profile_picture: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn list_union(movie: Movie) -> Self {
        Self {
            my_list: Some(ListOp::Union(vec![movie])),
            ..Default::default()
        }
    }

    pub fn list_remove(id: MovieId) -> Self {
        Self {
            my_list: Some(ListOp::Remove(vec![id])),
            ..Default::default()
        }
    }

    /// Applies the patch to a document in place
    pub fn apply_to(&self, document: &mut UserDocument) {
        if let Some(username) = &self.username {
            document.username = username.clone();
        }
        if let Some(url) = &self.profile_picture {
            document.profile_picture = url.clone();
        }
        match &self.my_list {
            Some(ListOp::Union(movies)) => {
                for movie in movies {
                    document.my_list.insert(movie.clone());
                }
            }
            Some(ListOp::Remove(ids)) => {
                for id in ids {
                    document.my_list.remove(*id);
                }
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_defaults_missing_fields() {
        let doc: UserDocument = serde_json::from_str(r#"{"username": "neo"}"#).unwrap();
        assert_eq!(doc.username, "neo");
        assert_eq!(doc.user_id, "");
        assert!(doc.my_list.is_empty());
    }

    #[test]
    fn test_document_uses_camel_case() {
        let doc = UserDocument::new("uid-1", "trinity");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["userId"], "uid-1");
        assert_eq!(json["profilePicture"], "");
        assert_eq!(json["myList"], serde_json::json!([]));
    }

    #[test]
    fn test_from_parts_without_document() {
        let identity = Identity::new("uid-9", Some("a@b.com".to_string()));
        let user = User::from_parts(&identity, None);
        assert_eq!(user.user_id, "uid-9");
        assert_eq!(user.username, "");
        assert!(user.my_list.is_empty());
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_refresh_keeps_previous_values_for_empty_fields() {
        let identity = Identity::new("uid-1", None);
        let mut user = User::from_parts(&identity, Some(UserDocument::new("uid-1", "morpheus")));
        user.profile_picture = "https://img/old.png".to_string();

        user.refresh_from(UserDocument::new("uid-1", "morpheus2"));

        assert_eq!(user.username, "morpheus2");
        assert_eq!(user.profile_picture, "https://img/old.png");
    }

    #[test]
    fn test_patch_apply_union_and_remove() {
        let mut doc = UserDocument::new("u", "n");
        UserPatch::list_union(Movie::new(1, "A")).apply_to(&mut doc);
        UserPatch::list_union(Movie::new(1, "A")).apply_to(&mut doc);
        UserPatch::list_union(Movie::new(2, "B")).apply_to(&mut doc);
        assert_eq!(doc.my_list.ids(), vec![MovieId(1), MovieId(2)]);

        UserPatch::list_remove(MovieId(1)).apply_to(&mut doc);
        assert_eq!(doc.my_list.ids(), vec![MovieId(2)]);
    }
}
