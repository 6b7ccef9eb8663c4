use crate::config::TokenStore;
use crate::github::{GitHubClient, Label, Repository};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use std::collections::BTreeMap;
use std::io;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "GitHub Explorer CLI - A tool for browsing GitHub repositories, issues and notifications"
)]
#[command(
    long_about = "A command-line interface for the GitHub REST API: list and search repositories, \
    show repository details, query issues, and check unread notifications. Authenticates with a \
    personal access token stored locally."
)]
pub struct Cli {
    /// Prompt for a GitHub personal access token and persist it
    #[arg(long)]
    save_token: bool,

    /// List the authenticated user's repositories with a language summary
    #[arg(long)]
    all_repo: bool,

    /// Search repositories by name or keyword
    #[arg(long, value_name = "QUERY")]
    search_repo: Option<String>,

    /// Show details of one repository
    #[arg(long, value_name = "OWNER/NAME")]
    show_repo: Option<String>,

    /// List issues for a repository
    #[arg(long, value_name = "OWNER/NAME")]
    query_issues: Option<String>,

    /// List unread notifications
    #[arg(long)]
    notify: bool,

    /// Generate shell completion scripts
    #[arg(long, value_enum, value_name = "SHELL")]
    completion: Option<Shell>,
}

impl Cli {
    pub fn run() -> Result<()> {
        let cli = Self::parse();
        let store = TokenStore::new()?;
        cli.dispatch(&store)
    }

    // Operations are mutually exclusive; the first one set wins. The token
    // is loaded before the client exists, so a missing token never reaches
    // the network.
    fn dispatch(&self, store: &TokenStore) -> Result<()> {
        if self.save_token {
            return save_token(store);
        }
        if self.all_repo {
            return fetch_all_repositories(&client_for(store)?);
        }
        if let Some(query) = &self.search_repo {
            return search_repositories(&client_for(store)?, query);
        }
        if let Some(full_name) = &self.show_repo {
            return show_repository(&client_for(store)?, full_name);
        }
        if let Some(full_name) = &self.query_issues {
            return query_issues(&client_for(store)?, full_name);
        }
        if self.notify {
            return check_notifications(&client_for(store)?);
        }
        if let Some(shell) = self.completion {
            let mut cmd = Self::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut io::stdout());
            return Ok(());
        }

        Self::command().print_help()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn parse_from(args: &[&str]) -> Self {
        Self::try_parse_from(args).unwrap()
    }
}

fn client_for(store: &TokenStore) -> Result<GitHubClient> {
    GitHubClient::new(store.load()?)
}

fn save_token(store: &TokenStore) -> Result<()> {
    let token = rpassword::prompt_password("Enter your GitHub personal access token: ")
        .context("Failed to read token")?;
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }

    store.save(token)?;
    println!("Token saved to {}", store.path().display());
    Ok(())
}

fn fetch_all_repositories(client: &GitHubClient) -> Result<()> {
    let repos = client.list_repositories()?;
    if repos.is_empty() {
        println!("No repositories found");
        return Ok(());
    }

    for repo in &repos {
        print_repository_summary(repo);
    }

    if repos.len() == 1 {
        println!("1 repository found");
    } else {
        println!("{} repositories found", repos.len());
    }

    println!("Languages:");
    for (language, count) in language_histogram(&repos) {
        println!("  {}: {}", language, count);
    }
    Ok(())
}

fn search_repositories(client: &GitHubClient, query: &str) -> Result<()> {
    let results = client.search_repositories(query)?;
    if results.items.is_empty() {
        println!("No repositories matched '{}'", query);
        return Ok(());
    }

    for repo in &results.items {
        println!("Repository Name: {}", repo.name);
        println!("Description: {}", optional(&repo.description));
        println!("Owner: {}", repo.owner.login);
        println!("Stars: {}", repo.stargazers_count);
        println!("Forks: {}", repo.forks_count);
        println!("URL: {}", repo.html_url);
        println!();
    }
    println!("{} repositories matched", results.total_count);
    Ok(())
}

fn show_repository(client: &GitHubClient, full_name: &str) -> Result<()> {
    let repo = client.get_repository(full_name)?;

    println!("Repository Name: {}", repo.name);
    println!("Description: {}", optional(&repo.description));
    println!("Owner: {}", repo.owner.login);
    println!("Language: {}", optional(&repo.language));
    println!("Default Branch: {}", repo.default_branch);
    println!(
        "License: {}",
        repo.license.as_ref().map(|l| l.name.as_str()).unwrap_or("-")
    );
    println!("Size: {} KB", repo.size);
    println!("Stars: {}", repo.stargazers_count);
    println!("Forks: {}", repo.forks_count);
    println!("URL: {}", repo.html_url);
    Ok(())
}

fn query_issues(client: &GitHubClient, full_name: &str) -> Result<()> {
    let issues = client.list_issues(full_name)?;
    if issues.is_empty() {
        println!("No issues found for {}", full_name);
        return Ok(());
    }

    for issue in &issues {
        println!("Title: {}", issue.title);
        println!("State: {}", issue.state);
        println!("URL: {}", issue.html_url);
        println!("Labels: {}", format_labels(&issue.labels));
        println!("Created At: {}", issue.created_at);
        println!();
    }
    Ok(())
}

fn check_notifications(client: &GitHubClient) -> Result<()> {
    let notifications = client.list_notifications()?;
    if notifications.is_empty() {
        println!("No unread notifications");
        return Ok(());
    }

    for notification in &notifications {
        println!("Notification Title: {}", notification.subject.title);
        println!("ID: {}", notification.id);
        println!("URL: {}", notification.subject.url.as_deref().unwrap_or("-"));
        println!("Updated At: {}", notification.updated_at);
        println!();
    }
    Ok(())
}

fn print_repository_summary(repo: &Repository) {
    println!("Repository Name: {}", repo.name);
    println!("Description: {}", optional(&repo.description));
    println!("Language: {}", optional(&repo.language));
    println!("Stars: {}", repo.stargazers_count);
    println!("Forks: {}", repo.forks_count);
    println!("Size: {} KB", repo.size);
    println!("URL: {}", repo.html_url);
    println!();
}

// Repositories without a primary language are counted under "-", matching
// how they are displayed. BTreeMap keeps the summary in alphabetical order.
fn language_histogram(repos: &[Repository]) -> BTreeMap<String, usize> {
    let mut languages = BTreeMap::new();
    for repo in repos {
        let language = repo.language.as_deref().unwrap_or("-").to_string();
        *languages.entry(language).or_insert(0) += 1;
    }
    languages
}

fn format_labels(labels: &[Label]) -> String {
    if labels.is_empty() {
        return "-".to_string();
    }
    labels
        .iter()
        .map(|l| l.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::Owner;

    fn repo_with_language(language: Option<&str>) -> Repository {
        Repository {
            name: "repo".to_string(),
            description: None,
            owner: Owner {
                login: "owner".to_string(),
            },
            language: language.map(String::from),
            default_branch: "main".to_string(),
            license: None,
            size: 0,
            stargazers_count: 0,
            forks_count: 0,
            html_url: "https://github.com/owner/repo".to_string(),
        }
    }

    #[test]
    fn test_save_token_flag() {
        let cli = Cli::parse_from(&["gex-cli", "--save-token"]);
        assert!(cli.save_token);
        assert!(!cli.all_repo);
    }

    #[test]
    fn test_all_repo_flag() {
        let cli = Cli::parse_from(&["gex-cli", "--all-repo"]);
        assert!(cli.all_repo);
    }

    #[test]
    fn test_search_repo_flag() {
        let cli = Cli::parse_from(&["gex-cli", "--search-repo", "ripgrep"]);
        assert_eq!(cli.search_repo.as_deref(), Some("ripgrep"));
    }

    #[test]
    fn test_show_repo_flag() {
        let cli = Cli::parse_from(&["gex-cli", "--show-repo", "octocat/hello-world"]);
        assert_eq!(cli.show_repo.as_deref(), Some("octocat/hello-world"));
    }

    #[test]
    fn test_query_issues_flag() {
        let cli = Cli::parse_from(&["gex-cli", "--query-issues", "octocat/hello-world"]);
        assert_eq!(cli.query_issues.as_deref(), Some("octocat/hello-world"));
    }

    #[test]
    fn test_notify_flag() {
        let cli = Cli::parse_from(&["gex-cli", "--notify"]);
        assert!(cli.notify);
    }

    #[test]
    fn test_multiple_flags_parse_together() {
        // Precedence is resolved at dispatch, not at parse time.
        let cli = Cli::parse_from(&["gex-cli", "--save-token", "--notify"]);
        assert!(cli.save_token);
        assert!(cli.notify);
    }

    #[test]
    fn test_dispatch_without_flags_prints_usage() -> Result<()> {
        let temp = assert_fs::TempDir::new()?;
        let store = TokenStore::at(temp.path().join("token"));

        let cli = Cli::parse_from(&["gex-cli"]);
        cli.dispatch(&store)
    }

    #[test]
    fn test_dispatch_without_token_fails_before_network() -> Result<()> {
        use crate::config::NotConfigured;

        let temp = assert_fs::TempDir::new()?;
        let store = TokenStore::at(temp.path().join("token"));

        for args in [
            vec!["gex-cli", "--all-repo"],
            vec!["gex-cli", "--search-repo", "ripgrep"],
            vec!["gex-cli", "--show-repo", "octocat/hello-world"],
            vec!["gex-cli", "--query-issues", "octocat/hello-world"],
            vec!["gex-cli", "--notify"],
        ] {
            let cli = Cli::parse_from(&args);
            let err = cli.dispatch(&store).unwrap_err();
            assert!(
                err.downcast_ref::<NotConfigured>().is_some(),
                "expected NotConfigured for {:?}",
                args
            );
        }
        Ok(())
    }

    #[test]
    fn test_language_histogram_counts() {
        let repos = vec![
            repo_with_language(Some("Go")),
            repo_with_language(Some("Rust")),
            repo_with_language(Some("Go")),
        ];

        let histogram = language_histogram(&repos);
        assert_eq!(histogram.get("Go"), Some(&2));
        assert_eq!(histogram.get("Rust"), Some(&1));
        assert_eq!(histogram.len(), 2);
    }

    #[test]
    fn test_language_histogram_is_alphabetical() {
        let repos = vec![
            repo_with_language(Some("Zig")),
            repo_with_language(Some("Ada")),
            repo_with_language(Some("Rust")),
        ];

        let histogram = language_histogram(&repos);
        let languages: Vec<&String> = histogram.keys().collect();
        assert_eq!(languages, vec!["Ada", "Rust", "Zig"]);
    }

    #[test]
    fn test_language_histogram_counts_missing_language() {
        let repos = vec![repo_with_language(None), repo_with_language(None)];

        let histogram = language_histogram(&repos);
        assert_eq!(histogram.get("-"), Some(&2));
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(format_labels(&[]), "-");

        let labels = vec![
            Label {
                name: "bug".to_string(),
            },
            Label {
                name: "help wanted".to_string(),
            },
        ];
        assert_eq!(format_labels(&labels), "bug, help wanted");
    }
}
