use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("gex-cli/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Non-2xx reply on the repository detail path. Carries the upstream
/// status line and body verbatim so the user sees what GitHub said.
#[derive(Debug, thiserror::Error)]
#[error("GitHub API returned {status}: {body}")]
pub struct StatusError {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub description: Option<String>,
    pub owner: Owner,
    pub language: Option<String>,
    pub default_branch: String,
    pub license: Option<License>,
    pub size: u64,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub html_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub state: String,
    pub html_url: String,
    pub labels: Vec<Label>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Subject {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub subject: Subject,
    pub updated_at: String,
}

/// Shape of `GET /search/repositories`. Decoded as a fixed schema so a
/// response without an `items` array fails as a parse error.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub items: Vec<Repository>,
}

pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: GITHUB_API_URL.to_string(),
            token,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .context("Invalid auth token")?,
        );
        Ok(headers)
    }

    fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .with_context(|| format!("Request to {} failed", url))
    }

    pub fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.get("/user/repos")?
            .json::<Vec<Repository>>()
            .context("Failed to parse repository list")
    }

    pub fn search_repositories(&self, query: &str) -> Result<SearchResults> {
        let path = format!("/search/repositories?q={}", urlencoding::encode(query));
        self.get(&path)?
            .json::<SearchResults>()
            .context("Failed to parse search results")
    }

    pub fn get_repository(&self, full_name: &str) -> Result<Repository> {
        let response = self.get(&format!("/repos/{}", full_name))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().context("Failed to read error response")?;
            return Err(StatusError { status, body }.into());
        }

        response
            .json::<Repository>()
            .context("Failed to parse repository")
    }

    pub fn list_issues(&self, full_name: &str) -> Result<Vec<Issue>> {
        self.get(&format!("/repos/{}/issues", full_name))?
            .json::<Vec<Issue>>()
            .context("Failed to parse issue list")
    }

    pub fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.get("/notifications")?
            .json::<Vec<Notification>>()
            .context("Failed to parse notification list")
    }
}
