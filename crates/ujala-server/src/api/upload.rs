//! Multipart submission forms.

use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ServerError;
use crate::media_store::MediaStore;

/// Text fields and stored files of one submission.
#[derive(Debug, Default)]
pub(crate) struct SubmissionForm {
    fields: HashMap<String, String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub gallery: Vec<String>,
}

impl SubmissionForm {
    /// Read every part, storing files as they arrive. On failure the files
    /// already written are removed again.
    pub async fn read(mut multipart: Multipart, media: &MediaStore) -> Result<Self, ServerError> {
        let mut form = SubmissionForm::default();
        if let Err(e) = form.read_parts(&mut multipart, media).await {
            for path in form.uploaded_paths() {
                let _ = media.delete(&path).await;
            }
            return Err(e);
        }
        Ok(form)
    }

    async fn read_parts(&mut self, multipart: &mut Multipart, media: &MediaStore) -> Result<(), ServerError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "image" | "video" | "gallery" => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
                    // Browsers send an empty part for an untouched file input.
                    if data.is_empty() {
                        continue;
                    }
                    let path = media.save_upload(&file_name, &data).await?;
                    match name.as_str() {
                        "image" => replace_upload(&mut self.image, path, media).await,
                        "video" => replace_upload(&mut self.video, path, media).await,
                        _ => self.gallery.push(path),
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
                    self.fields.insert(name, value);
                }
            }
        }
        Ok(())
    }

    /// Every file this submission wrote.
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.image
            .iter()
            .chain(self.video.iter())
            .chain(self.gallery.iter())
            .cloned()
            .collect()
    }

    /// Trimmed, non-empty text field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.text(name).map(|v| v.to_ascii_lowercase()).as_deref(),
            Some("true" | "1" | "on" | "yes")
        )
    }

    /// Comma separated tags; `None` when the field is absent.
    pub fn tags(&self) -> Option<Vec<String>> {
        self.fields.get("tags").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    /// `eventDate` as RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
    pub fn event_date(&self) -> Result<Option<DateTime<Utc>>, ServerError> {
        let Some(raw) = self.text("eventDate") else {
            return Ok(None);
        };
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Some(dt.and_utc()))
            .ok_or_else(|| ServerError::Validation("Invalid eventDate".into()))
    }

    /// Title, description and content must all be present on create.
    pub fn require_body(&self) -> Result<(String, String, String), ServerError> {
        match (self.text("title"), self.text("description"), self.text("content")) {
            (Some(title), Some(description), Some(content)) => Ok((title, description, content)),
            _ => Err(ServerError::Validation("Missing required fields".into())),
        }
    }

    #[cfg(test)]
    pub fn with_fields(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

/// A second part with the same single-file name wins; the first file is
/// dropped from disk.
async fn replace_upload(slot: &mut Option<String>, path: String, media: &MediaStore) {
    if let Some(previous) = slot.replace(path) {
        let _ = media.delete(&previous).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_flags() {
        let form = SubmissionForm::with_fields(&[
            ("title", "  Budget session  "),
            ("author", "   "),
            ("isGallery", "TRUE"),
            ("isEvent", "no"),
        ]);
        assert_eq!(form.text("title").as_deref(), Some("Budget session"));
        assert_eq!(form.text("author"), None);
        assert!(form.flag("isGallery"));
        assert!(!form.flag("isEvent"));
        assert!(!form.flag("missing"));
    }

    #[test]
    fn test_tags() {
        assert_eq!(SubmissionForm::default().tags(), None);
        let form = SubmissionForm::with_fields(&[("tags", "city, traffic,, ")]);
        assert_eq!(form.tags(), Some(vec!["city".to_string(), "traffic".to_string()]));
    }

    #[test]
    fn test_event_date_formats() {
        let day = SubmissionForm::with_fields(&[("eventDate", "2024-03-15")]);
        assert_eq!(
            day.event_date().unwrap().unwrap().to_rfc3339(),
            "2024-03-15T00:00:00+00:00"
        );

        let full = SubmissionForm::with_fields(&[("eventDate", "2024-03-15T10:30:00+05:30")]);
        assert_eq!(
            full.event_date().unwrap().unwrap().to_rfc3339(),
            "2024-03-15T05:00:00+00:00"
        );

        let bad = SubmissionForm::with_fields(&[("eventDate", "next friday")]);
        assert!(bad.event_date().is_err());
        assert_eq!(SubmissionForm::default().event_date().unwrap(), None);
    }

    #[test]
    fn test_require_body() {
        let partial = SubmissionForm::with_fields(&[("title", "t"), ("content", "c")]);
        assert!(matches!(partial.require_body(), Err(ServerError::Validation(_))));

        let full = SubmissionForm::with_fields(&[("title", "t"), ("description", "d"), ("content", "c")]);
        assert_eq!(
            full.require_body().unwrap(),
            ("t".to_string(), "d".to_string(), "c".to_string())
        );
    }
}
