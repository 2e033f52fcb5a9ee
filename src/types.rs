//! Defines core value types: the crate `Result` alias and remote URL classification.
use super::GitError;
use once_cell::sync::Lazy;
use regex::Regex;
#[cfg(feature = "serde")]
use serde::Serialize;
use std::str::FromStr;
use std::{
    fmt,
    fmt::{Display, Formatter},
    result::Result as stdResult,
};

/// A specialized `Result` type for repository operations.
pub type Result<A> = stdResult<A, GitError>;

/// Host name that marks a remote as GitHub-hosted.
const GITHUB_HOST: &str = "github.com";

// scp-like syntax: git@github.com:owner/repo.git
static SCP_REMOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.-]+@(?P<host>[\w.-]+):/?(?P<owner>[\w.-]+)/(?P<repo>[\w.-]+?)(?:\.git)?/?$")
        .expect("Invalid static scp remote regex")
});

// URL syntax: https://github.com/owner/repo(.git), ssh://git@host:22/owner/repo.git
static URL_REMOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?|ssh|git)://(?:[^@/\s]+@)?(?P<host>[\w.-]+)(?::\d+)?/(?P<owner>[\w.-]+)/(?P<repo>[\w.-]+?)(?:\.git)?/?$",
    )
    .expect("Invalid static URL remote regex")
});

/// Which hosting provider a repository's remote points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ProviderKind {
    /// The remote is hosted on github.com.
    GitHub,
    /// A remote is configured but it is not GitHub (or could not be parsed).
    Other,
    /// No remote is configured.
    None,
}

/// A remote URL split into host, owner and repository name.
///
/// Created with `FromStr`. Both the scp-like SSH form (`git@host:owner/repo.git`)
/// and URL forms (`https://host/owner/repo.git`, trailing `.git` optional) are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub(crate) value: String,
    host: String,
    owner: String,
    repo: String,
}

impl RemoteUrl {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name without any `.git` suffix.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Whether the host is `github.com`, compared case-insensitively.
    pub fn is_github(&self) -> bool {
        self.host.eq_ignore_ascii_case(GITHUB_HOST)
    }

    /// The web page for the repository, only known for GitHub remotes.
    pub fn browsable_url(&self) -> Option<String> {
        self.is_github()
            .then(|| format!("https://{}/{}/{}", GITHUB_HOST, self.owner, self.repo))
    }
}

impl FromStr for RemoteUrl {
    type Err = GitError;

    /// Parses a remote URL, returning `Err(GitError::InvalidRemoteUrl)` if it
    /// matches neither the scp-like nor the URL form.
    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        let captures = SCP_REMOTE_REGEX
            .captures(value)
            .or_else(|| URL_REMOTE_REGEX.captures(value))
            .ok_or_else(|| GitError::InvalidRemoteUrl(value.to_string()))?;

        Ok(RemoteUrl {
            value: value.to_string(),
            host: captures["host"].to_string(),
            owner: captures["owner"].to_string(),
            repo: captures["repo"].to_string(),
        })
    }
}

impl Display for RemoteUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl AsRef<str> for RemoteUrl {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

/// Result of classifying a remote URL string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RemoteClassification {
    pub is_github: bool,
    pub browsable_url: Option<String>,
}

impl RemoteClassification {
    /// Maps the classification onto a provider, given whether a remote exists at all.
    pub fn provider(&self, has_remote: bool) -> ProviderKind {
        match (has_remote, self.is_github) {
            (false, _) => ProviderKind::None,
            (true, true) => ProviderKind::GitHub,
            (true, false) => ProviderKind::Other,
        }
    }
}

/// Classifies a remote URL. Never fails: malformed input is simply "not GitHub".
pub fn classify(remote: &str) -> RemoteClassification {
    match RemoteUrl::from_str(remote) {
        Ok(url) => RemoteClassification {
            is_github: url.is_github(),
            browsable_url: url.browsable_url(),
        },
        Err(_) => RemoteClassification {
            is_github: false,
            browsable_url: None,
        },
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_ssh_remote() {
        let result = classify("git@github.com:user/repo.git");
        assert!(result.is_github);
        assert_eq!(
            result.browsable_url.as_deref(),
            Some("https://github.com/user/repo")
        );
    }

    #[test]
    fn test_github_https_remotes() {
        let remotes = vec![
            "https://github.com/user/repo.git",
            "https://github.com/user/repo",
            "https://github.com/user/repo/",
            "http://github.com/user/repo.git",
            "https://token@github.com/user/repo.git",
            "ssh://git@github.com/user/repo.git",
            "ssh://git@github.com:22/user/repo.git",
            "https://GitHub.COM/user/repo.git",
            "  git@github.com:user/repo.git\n",
        ];

        for remote in remotes.iter() {
            let result = classify(remote);
            assert!(result.is_github, "Expected GitHub: {:?}", remote);
            assert_eq!(
                result.browsable_url.as_deref(),
                Some("https://github.com/user/repo"),
                "Unexpected browsable URL for {:?}",
                remote
            );
        }
    }

    #[test]
    fn test_repo_names_with_dots_keep_their_name() {
        let result = classify("git@github.com:rust-lang/rust.vim.git");
        assert_eq!(
            result.browsable_url.as_deref(),
            Some("https://github.com/rust-lang/rust.vim")
        );

        let url = RemoteUrl::from_str("https://github.com/user/my.project").unwrap();
        assert_eq!(url.repo(), "my.project");
    }

    #[test]
    fn test_non_github_hosts() {
        let remotes = vec![
            "git@gitlab.com:user/repo.git",
            "https://gitlab.com/user/repo.git",
            "https://bitbucket.org/user/repo",
            "git@github.com.evil.example:user/repo.git",
        ];

        for remote in remotes.iter() {
            let result = classify(remote);
            assert!(!result.is_github, "Expected non-GitHub: {:?}", remote);
            assert_eq!(result.browsable_url, None);
        }
    }

    #[test]
    fn test_malformed_remotes_do_not_panic() {
        let remotes = vec![
            "",
            "not a url",
            "/path/to/repo.git",
            "file:///path/to/repo.git",
            "git@github.com:repo-without-owner.git",
            "https://github.com/",
            "https://github.com/user/repo/extra/segment",
        ];

        for remote in remotes.iter() {
            let result = classify(remote);
            assert!(!result.is_github, "Expected rejection: {:?}", remote);
            assert_eq!(result.browsable_url, None);
            assert!(RemoteUrl::from_str(remote).is_err(), "Expected Err: {:?}", remote);
        }
    }

    #[test]
    fn test_remote_url_parts() {
        let url = RemoteUrl::from_str("git@gitlab.com:group/project.git").unwrap();
        assert_eq!(url.host(), "gitlab.com");
        assert_eq!(url.owner(), "group");
        assert_eq!(url.repo(), "project");
        assert_eq!(url.to_string(), "git@gitlab.com:group/project.git");
        assert!(!url.is_github());
    }

    #[test]
    fn test_provider_kind() {
        assert_eq!(classify("git@github.com:u/r.git").provider(true), ProviderKind::GitHub);
        assert_eq!(classify("git@gitlab.com:u/r.git").provider(true), ProviderKind::Other);
        assert_eq!(classify("").provider(false), ProviderKind::None);
    }
}
