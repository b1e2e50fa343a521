use super::rest::{RestClient, TokenSource};
use crate::error::{BqSyncError, Result};
use crate::resource::SavedQueryInfo;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const DATAFORM_URL: &str = "https://dataform.googleapis.com";

#[derive(Debug, Default, Deserialize)]
struct Named {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryPage {
    #[serde(default)]
    repositories: Vec<Named>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkspacePage {
    #[serde(default)]
    workspaces: Vec<Named>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryEntry {
    file: Option<String>,
    directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryPage {
    #[serde(default)]
    directory_entries: Vec<DirectoryEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileContents {
    #[serde(default)]
    file_contents: String,
}

/// Reads BigQuery Studio saved queries, which live as `.sql` files in
/// Dataform workspaces.
///
/// The Dataform surface for saved queries is new and may change; callers
/// should treat failures as "no saved queries".
#[derive(Debug, Clone)]
pub struct DataformClient {
    rest: RestClient,
}

impl DataformClient {
    pub fn new(tokens: TokenSource) -> Self {
        Self::with_base_url(DATAFORM_URL, tokens)
    }

    pub fn with_base_url(base_url: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            rest: RestClient::new(base_url, tokens),
        }
    }

    pub async fn list_saved_queries(
        &self,
        project: &str,
        region: &str,
    ) -> Result<Vec<SavedQueryInfo>> {
        let mut saved = Vec::new();
        let parent = format!("projects/{}/locations/{}", project, region);

        for repo in self.repositories(&parent).await? {
            for workspace in self.workspaces(&repo).await? {
                for file in self.sql_files(&workspace).await? {
                    let sql = self.read_file(&workspace, &file).await?;
                    saved.push(SavedQueryInfo {
                        name: saved_query_name(&file),
                        sql,
                        // Dataform does not report per-file modification times.
                        modified: DateTime::<Utc>::UNIX_EPOCH,
                    });
                }
            }
        }

        Ok(saved)
    }

    async fn repositories(&self, parent: &str) -> Result<Vec<String>> {
        let path = format!("v1beta1/{}/repositories", parent);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let query = page_query(page_token.as_deref());
            let page: RepositoryPage = self.rest.get_json(&path, &query).await?;
            names.extend(page.repositories.into_iter().map(|r| r.name));
            match next(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => return Ok(names),
            }
        }
    }

    async fn workspaces(&self, repo: &str) -> Result<Vec<String>> {
        let path = format!("v1beta1/{}/workspaces", repo);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let query = page_query(page_token.as_deref());
            let page: WorkspacePage = self.rest.get_json(&path, &query).await?;
            names.extend(page.workspaces.into_iter().map(|w| w.name));
            match next(page.next_page_token) {
                Some(token) => page_token = Some(token),
                None => return Ok(names),
            }
        }
    }

    /// Every `.sql` file in the workspace, walking subdirectories.
    async fn sql_files(&self, workspace: &str) -> Result<Vec<String>> {
        let path = format!("v1beta1/{}:queryDirectoryContents", workspace);
        let mut files = Vec::new();
        let mut pending: Vec<Option<String>> = vec![None];

        while let Some(dir) = pending.pop() {
            let mut page_token: Option<String> = None;
            loop {
                let mut query = page_query(page_token.as_deref());
                if let Some(dir) = dir.as_deref() {
                    query.push(("path", dir));
                }
                let page: DirectoryPage = self.rest.get_json(&path, &query).await?;
                for entry in page.directory_entries {
                    match (entry.file, entry.directory) {
                        (Some(file), _) if file.ends_with(".sql") => files.push(file),
                        (None, Some(sub)) => pending.push(Some(sub)),
                        _ => {}
                    }
                }
                match next(page.next_page_token) {
                    Some(token) => page_token = Some(token),
                    None => break,
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read_file(&self, workspace: &str, file: &str) -> Result<String> {
        let path = format!("v1beta1/{}:readFile", workspace);
        let contents: FileContents = self.rest.get_json(&path, &[("path", file)]).await?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(contents.file_contents.as_bytes())
            .map_err(|e| BqSyncError::InvalidResponse(format!("file contents of {}: {}", file, e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn page_query(token: Option<&str>) -> Vec<(&'static str, &str)> {
    match token {
        Some(token) => vec![("pageToken", token)],
        None => Vec::new(),
    }
}

fn next(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

fn saved_query_name(file: &str) -> String {
    let base = file.rsplit('/').next().unwrap_or(file);
    base.strip_suffix(".sql").unwrap_or(base).to_string()
}
