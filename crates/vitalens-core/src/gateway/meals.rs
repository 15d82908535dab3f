//! Meal upload gateway

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use super::client::{classify_resource, ApiClient};
use super::multipart::MultipartForm;
use super::progress::ProgressReporter;
use super::transport::HttpRequest;
use crate::error::{Error, Result};
use crate::models::{MealRecord, MealType};

const UPLOAD_PATH: &str = "/meals/upload";

/// Extensions the backend can analyze
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "pdf", "csv"];

/// MIME type for an allowed extension (case-insensitive)
pub fn mime_type_for(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "pdf" => Some("application/pdf"),
        "csv" => Some("text/csv"),
        _ => None,
    }
}

/// Check the extension of `file_name` and return its MIME type
pub fn validate_file_name(file_name: &str) -> Result<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    mime_type_for(extension).ok_or_else(|| {
        Error::invalid_file(format!(
            "{}: unsupported file type, expected one of {}",
            file_name,
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })
}

/// A meal file ready to be uploaded
#[derive(Clone, PartialEq, Eq)]
pub struct MealUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub meal_type: MealType,
    pub meal_date: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for MealUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealUpload")
            .field("file_name", &self.file_name)
            .field("size", &self.contents.len())
            .field("meal_type", &self.meal_type)
            .field("meal_date", &self.meal_date)
            .finish()
    }
}

impl MealUpload {
    pub fn new(file_name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            contents,
            meal_type: MealType::default(),
            meal_date: None,
        }
    }

    pub fn with_meal_type(mut self, meal_type: MealType) -> Self {
        self.meal_type = meal_type;
        self
    }

    pub fn with_meal_date(mut self, meal_date: DateTime<Utc>) -> Self {
        self.meal_date = Some(meal_date);
        self
    }

    /// Read a file from disk
    ///
    /// The extension is checked before the file is opened.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid_file(format!("{}: no file name", path.display())))?
            .to_string();

        validate_file_name(&file_name)?;

        let contents = tokio::fs::read(path).await.map_err(|e| {
            log::warn!("[meals] Failed to read {}: {}", path.display(), e);
            Error::invalid_file(format!("{}: {}", path.display(), e))
        })?;

        Ok(Self::new(file_name, contents))
    }

    fn encode(&self, content_type: &str) -> MultipartForm {
        let mut form = MultipartForm::new()
            .file("file", &self.file_name, content_type, self.contents.clone())
            .text("meal_type", self.meal_type.as_str());

        if let Some(date) = self.meal_date {
            form = form.text("meal_date", date.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        form
    }
}

#[derive(Debug, Clone)]
pub struct MealGateway {
    client: ApiClient,
}

impl MealGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Upload a meal file for analysis
    ///
    /// Invalid files and a missing access token fail before anything is
    /// sent. Progress reaches `1.0` only once the created meal has decoded.
    pub async fn upload_meal(
        &self,
        upload: &MealUpload,
        progress: &ProgressReporter,
    ) -> Result<MealRecord> {
        let content_type = validate_file_name(&upload.file_name)?;
        let url = self.client.endpoint(UPLOAD_PATH, &[])?;
        let token = self.client.bearer_token()?;

        let request = HttpRequest::post(url)
            .bearer(&token)
            .multipart(upload.encode(content_type));

        log::info!(
            "[meals] Uploading {} ({} bytes) as {}",
            upload.file_name,
            request.body_len(),
            upload.meal_type
        );

        progress.report(0.0);
        let response = self
            .client
            .send_with_progress(request, progress.bytes_callback())
            .await?;

        let meal: MealRecord = classify_resource(response).map_err(|e| {
            log::warn!("[meals] Upload of {} failed: {}", upload.file_name, e);
            e
        })?;

        progress.complete();
        log::info!(
            "[meals] Created meal {} with {} food items",
            meal.id,
            meal.food_items.len()
        );
        Ok(meal)
    }

    /// Read `path` and upload it
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        meal_type: MealType,
        meal_date: Option<DateTime<Utc>>,
        progress: &ProgressReporter,
    ) -> Result<MealRecord> {
        let mut upload = MealUpload::from_path(path).await?.with_meal_type(meal_type);
        upload.meal_date = meal_date;
        self.upload_meal(&upload, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::multipart::FormPart;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_allowed_extensions() {
        assert_eq!(validate_file_name("meal.JPG").unwrap(), "image/jpeg");
        assert_eq!(validate_file_name("scan.jpeg").unwrap(), "image/jpeg");
        assert_eq!(validate_file_name("plate.Png").unwrap(), "image/png");
        assert_eq!(validate_file_name("receipt.pdf").unwrap(), "application/pdf");
        assert_eq!(validate_file_name("log.csv").unwrap(), "text/csv");
        assert_eq!(validate_file_name("old.bmp").unwrap(), "image/bmp");
        assert_eq!(validate_file_name("anim.gif").unwrap(), "image/gif");
    }

    #[test]
    fn test_rejected_extensions() {
        for name in ["notes.txt", "photo.heic", "no_extension", "archive.csv.zip", ".png"] {
            assert!(
                matches!(validate_file_name(name), Err(Error::InvalidFile(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_encode_with_meal_date() {
        let date = Utc.with_ymd_and_hms(2025, 12, 21, 12, 30, 0).unwrap();
        let upload = MealUpload::new("lunch.png", b"PNG".to_vec())
            .with_meal_type(MealType::Lunch)
            .with_meal_date(date);

        let form = upload.encode("image/png");
        assert_eq!(
            form.part("file"),
            Some(&FormPart::File {
                name: "file".to_string(),
                file_name: "lunch.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: b"PNG".to_vec(),
            })
        );
        assert_eq!(form.text_value("meal_type"), Some("lunch"));
        assert_eq!(form.text_value("meal_date"), Some("2025-12-21T12:30:00Z"));
    }

    #[test]
    fn test_encode_without_meal_date() {
        let form = MealUpload::new("data.csv", b"a,b".to_vec()).encode("text/csv");
        assert_eq!(form.text_value("meal_type"), Some("other"));
        assert!(form.part("meal_date").is_none());
        assert_eq!(form.parts().len(), 2);
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"food,grams\napple,150\n").unwrap();

        let upload = MealUpload::from_path(file.path()).await.unwrap();
        assert_eq!(upload.contents, b"food,grams\napple,150\n");
        assert!(upload.file_name.ends_with(".csv"));
        assert_eq!(upload.meal_type, MealType::Other);
    }

    #[tokio::test]
    async fn test_from_path_checks_extension_first() {
        let file = NamedTempFile::new().unwrap();
        let txt = file.path().with_extension("txt");
        let err = MealUpload::from_path(&txt).await.unwrap_err();
        assert!(matches!(err, Error::InvalidFile(msg) if msg.contains("unsupported")));
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MealUpload::from_path(dir.path().join("gone.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFile(_)));
    }
}
