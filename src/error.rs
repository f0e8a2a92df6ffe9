/// Per-match failures. All of them are recoverable: the run logs the error and
/// moves on to the next URL.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// No strategy produced a document for the URL.
    #[error("fetch failed for {url}: {}", .attempts.join("; "))]
    Fetch { url: String, attempts: Vec<String> },

    /// A document was retrieved but none of the locator strategies found a payload.
    /// `attempts` also keeps transport failures of the other strategies.
    #[error("no structured data located in {url}: {}", .attempts.join("; "))]
    NoStructuredData { url: String, attempts: Vec<String> },

    /// The payload was mined but no event carries the target team.
    #[error("no shots for {team} in {url}")]
    NoTeamShots { url: String, team: String },
}

impl ExtractError {
    pub fn url(&self) -> &str {
        match self {
            ExtractError::Fetch { url, .. }
            | ExtractError::NoStructuredData { url, .. }
            | ExtractError::NoTeamShots { url, .. } => url,
        }
    }

    /// Short label used in logs and the workbook failure listing.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Fetch { .. } => "fetch",
            ExtractError::NoStructuredData { .. } => "no-structured-data",
            ExtractError::NoTeamShots { .. } => "no-team-shots",
        }
    }
}

/// Raised by `DocumentFetcher::fetch` when every strategy failed at the transport level.
#[derive(thiserror::Error, Debug)]
#[error("all fetch strategies failed for {url}: {}", .attempts.join("; "))]
pub struct FetchError {
    pub url: String,
    pub attempts: Vec<String>,
}

/// Whole-run failures. These end the run without producing a workbook.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("no match urls provided")]
    NoUrls,

    #[error("no data extracted from {attempted} match url(s)")]
    NoDataExtracted { attempted: usize },
}
