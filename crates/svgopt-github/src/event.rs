//! Pull request context from the workflow event payload.

use std::path::Path;

use serde::Deserialize;
use svgopt_core::ChangeId;

use crate::error::GitHubError;

/// The pull request a run is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub number: u64,
    /// Head branch name, where commits are pushed.
    pub head_ref: String,
}

#[derive(Deserialize)]
struct Payload {
    pull_request: Option<PullRequest>,
}

#[derive(Deserialize)]
struct PullRequest {
    number: u64,
    head: Head,
}

#[derive(Deserialize)]
struct Head {
    #[serde(rename = "ref")]
    branch: String,
}

impl EventContext {
    pub fn change_id(&self) -> ChangeId {
        ChangeId(self.number)
    }

    /// Parse an event payload. Payloads of non pull request events yield `None`.
    pub fn from_json(payload: &str) -> Result<Option<Self>, GitHubError> {
        let payload: Payload =
            serde_json::from_str(payload).map_err(|e| GitHubError::Event(e.to_string()))?;

        Ok(payload.pull_request.map(|pr| EventContext {
            number: pr.number,
            head_ref: pr.head.branch,
        }))
    }

    /// Read and parse the payload file at `path` (`GITHUB_EVENT_PATH`).
    pub fn from_file(path: &Path) -> Result<Option<Self>, GitHubError> {
        let payload = std::fs::read_to_string(path)?;
        Self::from_json(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_payload() {
        let payload = r#"{
            "action": "synchronize",
            "number": 17,
            "pull_request": {
                "number": 17,
                "head": { "ref": "feature/icons", "sha": "abc" },
                "base": { "ref": "main" }
            }
        }"#;

        let ctx = EventContext::from_json(payload).unwrap().unwrap();
        assert_eq!(ctx.number, 17);
        assert_eq!(ctx.head_ref, "feature/icons");
        assert_eq!(ctx.change_id(), ChangeId(17));
    }

    #[test]
    fn test_push_payload_has_no_pull_request() {
        let payload = r#"{ "ref": "refs/heads/main", "commits": [] }"#;
        assert_eq!(EventContext::from_json(payload).unwrap(), None);
    }

    #[test]
    fn test_invalid_payload() {
        assert!(matches!(
            EventContext::from_json("not json"),
            Err(GitHubError::Event(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(
            &path,
            r#"{"pull_request":{"number":3,"head":{"ref":"svg"}}}"#,
        )
        .unwrap();

        let ctx = EventContext::from_file(&path).unwrap().unwrap();
        assert_eq!(ctx.number, 3);
        assert_eq!(ctx.head_ref, "svg");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = EventContext::from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(GitHubError::Io(_))));
    }
}
