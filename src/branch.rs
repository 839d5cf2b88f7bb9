//! Branch scoping for multi-branch restaurants.
//!
//! Every translation-bearing endpoint takes an optional `branchId` query
//! parameter. The branch is resolved once, from the stored session or the
//! access token's claims, and passed explicitly to each service.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use crate::api::ApiRequest;

const BRANCH_QUERY_PARAM: &str = "branchId";
const BRANCH_CLAIMS: &[&str] = &["branchId", "branch_id", "BranchId"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BranchContext {
    branch_id: Option<i64>,
}

impl BranchContext {
    /// No branch filter; the API answers for the whole restaurant.
    pub fn restaurant_wide() -> Self {
        Self { branch_id: None }
    }

    pub fn for_branch(branch_id: i64) -> Self {
        Self {
            branch_id: Some(branch_id),
        }
    }

    /// Stored branch id first, then the token's branch claim.
    pub fn resolve(stored_branch_id: Option<&str>, access_token: Option<&str>) -> Self {
        let branch_id = stored_branch_id
            .and_then(parse_branch_id)
            .or_else(|| access_token.and_then(branch_id_from_token));
        Self { branch_id }
    }

    pub fn branch_id(&self) -> Option<i64> {
        self.branch_id
    }

    /// Add the `branchId` query parameter when a branch is selected.
    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        match self.branch_id {
            Some(id) => request.query(BRANCH_QUERY_PARAM, id),
            None => request,
        }
    }
}

fn parse_branch_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Read the branch claim out of a JWT payload. The signature is not checked;
/// the server does that on every request.
fn branch_id_from_token(token: &str) -> Option<i64> {
    let token = token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token);
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;

    BRANCH_CLAIMS.iter().find_map(|claim| match claims.get(*claim)? {
        Value::Number(n) => n.as_i64().filter(|id| *id > 0),
        Value::String(s) => parse_branch_id(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(claims: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn stored_branch_wins_over_token() {
        let token = token_with(&serde_json::json!({ "branchId": 9 }));
        let ctx = BranchContext::resolve(Some("3"), Some(&token));
        assert_eq!(ctx.branch_id(), Some(3));
    }

    #[test]
    fn token_claim_is_used_when_nothing_stored() {
        let token = token_with(&serde_json::json!({ "sub": "u1", "branch_id": "12" }));
        assert_eq!(
            BranchContext::resolve(None, Some(&token)).branch_id(),
            Some(12)
        );

        let bearer = format!("Bearer {}", token_with(&serde_json::json!({ "BranchId": 5 })));
        assert_eq!(
            BranchContext::resolve(Some("not-a-number"), Some(&bearer)).branch_id(),
            Some(5)
        );
    }

    #[test]
    fn unresolvable_context_is_restaurant_wide() {
        assert_eq!(
            BranchContext::resolve(None, Some("garbage")),
            BranchContext::restaurant_wide()
        );
        assert_eq!(BranchContext::resolve(Some("0"), None).branch_id(), None);
    }

    #[test]
    fn apply_adds_query_only_with_branch() {
        let req = BranchContext::for_branch(4).apply(ApiRequest::get("/api/Languages/restaurant"));
        assert_eq!(req.query_value("branchId"), Some("4"));

        let req = BranchContext::restaurant_wide().apply(ApiRequest::get("/api/Languages"));
        assert!(req.query.is_empty());
    }
}
