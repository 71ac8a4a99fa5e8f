//! Anonymous token negotiation for registry auth challenges.

use std::collections::HashMap;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A parsed `WWW-Authenticate: Bearer ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: Option<String>,
    pub scope: Option<String>,
}

/// Token endpoint response. Registries use either field name.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BearerChallenge {
    /// Parse a challenge header value. Returns `None` for non-Bearer schemes or a missing realm.
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params) = header.split_once(char::is_whitespace)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut params = parse_params(params);
        let realm = params.remove("realm").filter(|r| !r.is_empty())?;
        Some(Self {
            realm,
            service: params.remove("service"),
            scope: params.remove("scope"),
        })
    }

    /// Query parameters for the token request, with `scope` as fallback when the
    /// challenge names none.
    pub fn token_query(&self, fallback_scope: &str) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(service) = &self.service {
            query.push(("service", service.clone()));
        }
        query.push((
            "scope",
            self.scope
                .clone()
                .unwrap_or_else(|| fallback_scope.to_string()),
        ));
        query
    }
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Option<String> {
        self.token
            .or(self.access_token)
            .filter(|t| !t.is_empty())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Pull scope for a repository.
pub fn pull_scope(repository: &str) -> String {
    format!("repository:{}:pull", repository)
}

/// Split `key="value", key2=value2` pairs. Quoted values may contain commas.
fn parse_params(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let key: String = chars
            .by_ref()
            .take_while(|c| *c != '=')
            .collect::<String>()
            .trim()
            .to_ascii_lowercase();
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' => break,
                    c => value.push(c),
                }
            }
        } else {
            while let Some(c) = chars.peek() {
                if *c == ',' {
                    break;
                }
                value.push(*c);
                chars.next();
            }
            value = value.trim().to_string();
        }

        params.insert(key, value);
    }

    params
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_hub_challenge() {
        let challenge = BearerChallenge::parse(
            r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:library/nginx:pull""#,
        )
        .unwrap();
        assert_eq!(challenge.realm, "https://auth.docker.io/token");
        assert_eq!(challenge.service.as_deref(), Some("registry.docker.io"));
        assert_eq!(
            challenge.scope.as_deref(),
            Some("repository:library/nginx:pull")
        );
    }

    #[test]
    fn test_scope_with_commas_and_unquoted_values() {
        let challenge = BearerChallenge::parse(
            r#"bearer realm=https://ghcr.io/token, scope="repository:a/b:pull,push""#,
        )
        .unwrap();
        assert_eq!(challenge.realm, "https://ghcr.io/token");
        assert_eq!(challenge.service, None);
        assert_eq!(challenge.scope.as_deref(), Some("repository:a/b:pull,push"));
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(BearerChallenge::parse(r#"Basic realm="registry""#).is_none());
        assert!(BearerChallenge::parse(r#"Bearer service="x""#).is_none());
        assert!(BearerChallenge::parse("").is_none());
    }

    #[test]
    fn test_token_query_fallback_scope() {
        let challenge = BearerChallenge {
            realm: "https://auth.example.com/token".into(),
            service: Some("example".into()),
            scope: None,
        };
        assert_eq!(
            challenge.token_query(&pull_scope("acme/server")),
            vec![
                ("service", "example".to_string()),
                ("scope", "repository:acme/server:pull".to_string())
            ]
        );
    }

    #[test]
    fn test_token_response_field_names() {
        let a: TokenResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(a.into_token().as_deref(), Some("abc"));
        let b: TokenResponse = serde_json::from_str(r#"{"access_token":"xyz"}"#).unwrap();
        assert_eq!(b.into_token().as_deref(), Some("xyz"));
        let c: TokenResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(c.into_token(), None);
    }
}
