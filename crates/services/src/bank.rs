use std::fmt;
use std::path::PathBuf;

use ktet_core::model::QuestionBank;
use reqwest::Client;
use url::Url;

use crate::error::BankLoadError;

/// Where the question bank document is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    File(PathBuf),
    Url(Url),
}

impl BankSource {
    /// Parse a source string: `http://` and `https://` become URLs, anything
    /// else is treated as a file path.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError::InvalidSource` for blank input or a malformed URL.
    pub fn parse(raw: &str) -> Result<Self, BankLoadError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BankLoadError::InvalidSource("empty source".into()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| BankLoadError::InvalidSource(format!("{trimmed}: {e}")))?;
            return Ok(Self::Url(url));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }

    /// Fetch and parse the bank. Called once per session start.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError` when the document cannot be read, the server
    /// answers with a non-success status, or the document is malformed.
    pub async fn load(&self, client: &Client) -> Result<QuestionBank, BankLoadError> {
        let body = match self {
            BankSource::File(path) => tokio::fs::read_to_string(path).await?,
            BankSource::Url(url) => {
                let response = client.get(url.clone()).send().await?;
                if !response.status().is_success() {
                    return Err(BankLoadError::HttpStatus(response.status()));
                }
                response.text().await?
            }
        };

        let bank = QuestionBank::from_json(&body)?;
        tracing::debug!(
            "loaded {} questions in {} categories from {self}",
            bank.question_count(),
            bank.categories().len()
        );
        Ok(bank)
    }
}

impl fmt::Display for BankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankSource::File(path) => write!(f, "{}", path.display()),
            BankSource::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn parses_urls_and_paths() {
        assert!(matches!(
            BankSource::parse("https://example.com/data/questions.json").unwrap(),
            BankSource::Url(_)
        ));
        assert_eq!(
            BankSource::parse(" data/questions.json ").unwrap(),
            BankSource::File(PathBuf::from("data/questions.json"))
        );
        assert!(BankSource::parse("   ").is_err());
        assert!(BankSource::parse("https://").is_err());
    }

    #[tokio::test]
    async fn loads_bank_from_file() {
        let path = std::env::temp_dir().join(format!("ktet-bank-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"categories":[{{"name":"English","questions":[
                {{"id":1,"question":"Pick the noun","options":["run","dog","blue","fast"],"correctIndex":1}}
            ]}}]}}"#
        )
        .unwrap();

        let bank = BankSource::File(path.clone())
            .load(&Client::new())
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bank.category("English").unwrap().len(), 1);
    }

    #[test]
    fn bundled_sample_bank_parses() {
        let bank = QuestionBank::from_json(include_str!("../../../data/questions.json")).unwrap();
        assert_eq!(bank.category("Mathematics").unwrap().len(), 5);
        assert!(bank.category("KTET Syllabus").unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_a_load_failure() {
        let err = BankSource::File(PathBuf::from("/definitely/not/here.json"))
            .load(&Client::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BankLoadError::Io(_)));
    }
}
