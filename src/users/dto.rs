use serde::Deserialize;

/// Patch body for a user record; absent fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 { 20 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").expect("parse empty");
        assert_eq!(p.limit, 20);
        assert_eq!(p.offset, 0);

        let p: Pagination = serde_json::from_str(r#"{"limit":5,"offset":10}"#).expect("parse");
        assert_eq!(p.limit, 5);
        assert_eq!(p.offset, 10);
    }

    #[test]
    fn user_update_fields_are_optional() {
        let u: UserUpdate = serde_json::from_str(r#"{"first_name":"Alice"}"#).expect("parse");
        assert_eq!(u.first_name.as_deref(), Some("Alice"));
        assert!(u.last_name.is_none());
        assert!(u.email.is_none());
    }
}
