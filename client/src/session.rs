use gloo_storage::{LocalStorage, Storage};

const TOKEN_KEY: &str = "token";
const LOGGED_IN_KEY: &str = "isLoggedIn";

// Written by the auth flow as plain strings, not JSON, so read them raw.
fn raw_item(key: &str) -> Option<String> {
    LocalStorage::raw().get_item(key).ok().flatten()
}

pub fn token() -> Option<String> {
    raw_item(TOKEN_KEY).filter(|t| !t.is_empty())
}

/// Current login state, read from storage on every call.
pub fn is_authenticated() -> bool {
    session_active(raw_item(LOGGED_IN_KEY).as_deref(), token().as_deref())
}

fn session_active(flag: Option<&str>, token: Option<&str>) -> bool {
    flag == Some("true") && token.is_some_and(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_flag_and_token() {
        assert!(session_active(Some("true"), Some("jwt")));
        assert!(!session_active(Some("true"), None));
        assert!(!session_active(Some("true"), Some("")));
        assert!(!session_active(Some("false"), Some("jwt")));
        assert!(!session_active(None, Some("jwt")));
    }
}
