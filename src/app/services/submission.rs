//! Submission pipeline: upload, validate, persist
//!
//! A [`SubmissionSession`] carries one uploaded trace from validation
//! through persistence to the annotation flow. It is passed explicitly
//! between steps; nothing is stashed in shared state.

use crate::app::adapters::store::{RowQuery, SortOrder, SubmissionStore};
use crate::app::models::MapPosition;
use crate::app::services::annotation_wizard::AnnotationWizard;
use crate::app::services::comfort::{ComfortLevel, photo_tags};
use crate::app::services::csv_analyzer::{CsvReportRow, ValidationSummary};
use crate::app::services::sensor_csv_parser::{ParseStats, SensorCsvParser, VisualizationResult};
use crate::config::IngestConfig;
use crate::constants::{IMAGE_BUCKET, IMAGE_TABLE, MAX_TAG_STORIES, SIGNED_URL_TTL_SECS};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Contributor details entered alongside a CSV upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvSubmissionForm {
    pub name: String,
    pub email: String,
    pub area_of_interest: String,
    pub mode_of_transport: String,
}

/// One uploaded trace and everything learned about it so far
#[derive(Debug, Clone)]
pub struct SubmissionSession {
    file_name: String,
    csv_text: String,
    summary: ValidationSummary,
    parse_stats: ParseStats,
    form: Option<CsvSubmissionForm>,
    csv_path: Option<String>,
    submission_id: Option<i64>,
}

impl SubmissionSession {
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn csv_text(&self) -> &str {
        &self.csv_text
    }

    pub fn summary(&self) -> &ValidationSummary {
        &self.summary
    }

    /// Diagnostics from the positional parse
    pub fn parse_stats(&self) -> &ParseStats {
        &self.parse_stats
    }

    pub fn form(&self) -> Option<&CsvSubmissionForm> {
        self.form.as_ref()
    }

    /// Object path of the stored CSV, once persisted
    pub fn csv_path(&self) -> Option<&str> {
        self.csv_path.as_deref()
    }

    pub fn submission_id(&self) -> Option<i64> {
        self.submission_id
    }

    pub fn is_submitted(&self) -> bool {
        self.submission_id.is_some()
    }

    /// Annotation flow bound to this session's submission row
    pub fn annotation_wizard(&self) -> AnnotationWizard {
        AnnotationWizard::new(self.submission_id)
    }
}

/// A photo observation with its self-reported comfort
#[derive(Debug, Clone)]
pub struct PhotoSubmission {
    pub file_name: String,
    pub image: Vec<u8>,
    pub comfort_level: ComfortLevel,
    pub comment: Option<String>,
    pub position: MapPosition,
    pub taken_at: DateTime<FixedOffset>,
    pub user_tags: Vec<String>,
}

/// A stored photo with a time-limited link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoListing {
    pub id: i64,
    pub comfort_level: ComfortLevel,
    pub position: MapPosition,
    pub tags: Vec<String>,
    pub url: String,
}

/// A tag with its photo count and the first photo stored under it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagStory {
    pub tag: String,
    pub representative: PhotoListing,
    pub count: usize,
}

/// A photo row decoded from the store, before its link is signed
#[derive(Debug, Clone)]
struct StoredPhoto {
    id: i64,
    comfort_level: ComfortLevel,
    position: MapPosition,
    tags: Vec<String>,
    image_path: String,
}

impl StoredPhoto {
    /// Decode a row; rows with an unknown comfort label or no image are skipped
    fn from_row(row: &Value) -> Option<Self> {
        let id = row.get("id").and_then(Value::as_i64).unwrap_or_default();
        let comfort_level = match row
            .get("comfort_level")
            .and_then(Value::as_str)
            .map(str::parse::<ComfortLevel>)
        {
            Some(Ok(level)) => level,
            Some(Err(e)) => {
                warn!("Skipping photo row {}: {}", id, e);
                return None;
            }
            None => {
                warn!("Skipping photo row {} without comfort level", id);
                return None;
            }
        };
        let Some(image_path) = row.get("image_url").and_then(Value::as_str) else {
            warn!("Skipping photo row {} without image path", id);
            return None;
        };

        Some(Self {
            id,
            comfort_level,
            position: MapPosition {
                lat: row.get("lat").and_then(Value::as_f64).unwrap_or_default(),
                lng: row.get("long").and_then(Value::as_f64).unwrap_or_default(),
            },
            tags: row
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            image_path: image_path.to_string(),
        })
    }
}

/// Drives sessions through validation and persistence
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn SubmissionStore>,
    config: IngestConfig,
    parser: SensorCsvParser,
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn SubmissionStore>, config: IngestConfig) -> Self {
        let parser = SensorCsvParser::from_config(&config);
        Self {
            store,
            config,
            parser,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn SubmissionStore {
        self.store.as_ref()
    }

    /// Parse and analyze uploaded text; never fails
    pub fn validate(
        &self,
        file_name: impl Into<String>,
        csv_text: impl Into<String>,
    ) -> SubmissionSession {
        let file_name = file_name.into();
        let csv_text = csv_text.into();

        let parsed = self.parser.parse_positional(&csv_text);
        let summary = ValidationSummary::build(&parsed.records, self.config.preview_rows);

        if summary.has_issues() {
            warn!("{}: {}", file_name, summary.issue_list());
        } else {
            info!(
                "{}: {} records, {} minutes",
                file_name, summary.report.num_records, summary.report.total_minutes
            );
        }

        SubmissionSession {
            file_name,
            csv_text,
            summary,
            parse_stats: parsed.stats,
            form: None,
            csv_path: None,
            submission_id: None,
        }
    }

    /// Read a trace from disk and validate it
    pub async fn validate_file(&self, path: &Path) -> Result<SubmissionSession> {
        let csv_text = SensorCsvParser::read_trace(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.validate(file_name, csv_text))
    }

    /// Drawable points for the session's trace
    pub fn visualize(&self, session: &SubmissionSession) -> VisualizationResult {
        self.parser.parse_for_visualization(&session.csv_text)
    }

    /// Store the CSV and its report row
    ///
    /// A trace with no data rows is refused outright. Any other issue must
    /// be acknowledged by the caller (the "submit anyway" choice). On
    /// success the session records the object path and row id.
    pub async fn submit(
        &self,
        session: &mut SubmissionSession,
        form: CsvSubmissionForm,
        acknowledge_issues: bool,
    ) -> Result<i64> {
        if let Some(id) = session.submission_id {
            debug!("{} already submitted as {}", session.file_name, id);
            return Ok(id);
        }
        if session.summary.is_blocked() {
            return Err(Error::no_data_rows(&session.file_name));
        }
        if session.summary.has_issues() && !acknowledge_issues {
            return Err(Error::validation_not_acknowledged(
                session.summary.issue_list(),
            ));
        }

        let object_path = object_path_for(&session.file_name);
        let csv_path = self
            .store
            .upload(
                &self.config.csv_bucket,
                &object_path,
                session.csv_text.clone().into_bytes(),
            )
            .await?;

        let row = submission_row(&form, &csv_path, &session.summary)?;
        let id = self.store.insert_row(&self.config.csv_table, row).await?;

        info!(
            "Submitted {} as row {} in {}",
            session.file_name, id, self.config.csv_table
        );
        session.form = Some(form);
        session.csv_path = Some(csv_path);
        session.submission_id = Some(id);
        Ok(id)
    }

    /// Store a photo and its tagged row
    pub async fn submit_photo(&self, photo: PhotoSubmission) -> Result<i64> {
        if !photo.position.is_valid() {
            return Err(Error::invalid_input(format!(
                "Photo location ({}, {}) is out of range",
                photo.position.lat, photo.position.lng
            )));
        }

        let object_path = object_path_for(&photo.file_name);
        let image_path = self
            .store
            .upload(IMAGE_BUCKET, &object_path, photo.image)
            .await?;

        let tags = photo_tags(&photo.user_tags, photo.comfort_level, &photo.taken_at);
        let row = serde_json::json!({
            "image_url": image_path,
            "comfort_level": photo.comfort_level,
            "comment": photo.comment,
            "lat": photo.position.lat,
            "long": photo.position.lng,
            "created_at": photo.taken_at.to_rfc3339(),
            "tags": tags,
        });
        let id = self.store.insert_row(IMAGE_TABLE, row).await?;
        info!("Stored photo {} as row {}", photo.file_name, id);
        Ok(id)
    }

    /// Most recent photos, newest first, with signed links
    ///
    /// Rows that cannot be decoded or signed are skipped with a warning.
    pub async fn recent_photos(&self, limit: usize) -> Result<Vec<PhotoListing>> {
        let query = RowQuery::new()
            .order("created_at", SortOrder::Descending)
            .limit(limit);
        self.listings(&query).await
    }

    /// Newest photos carrying `tag`, at most `limit` of them
    pub async fn photos_with_tag(&self, tag: &str, limit: usize) -> Result<Vec<PhotoListing>> {
        let query = RowQuery::new()
            .contains("tags", tag)
            .order("created_at", SortOrder::Descending)
            .limit(limit);
        self.listings(&query).await
    }

    /// Photos for one tag, capped at the story length
    pub async fn tag_story(&self, tag: &str) -> Result<Vec<PhotoListing>> {
        self.photos_with_tag(tag, MAX_TAG_STORIES).await
    }

    /// One story per distinct tag, most photographed tags first
    ///
    /// The representative is the first stored photo carrying the tag. Tags
    /// whose representative cannot be signed are left out.
    pub async fn tag_index(&self) -> Result<Vec<TagStory>> {
        let query = RowQuery::new().order("id", SortOrder::Ascending);
        let photos: Vec<StoredPhoto> = self
            .store
            .read_rows(IMAGE_TABLE, &query)
            .await?
            .iter()
            .filter_map(StoredPhoto::from_row)
            .collect();

        // tag -> (index of first photo, photo count), in order of first appearance
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, (usize, usize)> = HashMap::new();
        for (index, photo) in photos.iter().enumerate() {
            let mut seen: Vec<&str> = Vec::new();
            for tag in &photo.tags {
                if seen.contains(&tag.as_str()) {
                    continue;
                }
                seen.push(tag);
                groups
                    .entry(tag.clone())
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert_with(|| {
                        order.push(tag.clone());
                        (index, 1)
                    });
            }
        }

        let ttl = Duration::from_secs(SIGNED_URL_TTL_SECS);
        let mut stories = Vec::with_capacity(order.len());
        for tag in order {
            let (index, count) = groups[&tag];
            if let Some(representative) = self.sign(&photos[index], ttl).await {
                stories.push(TagStory {
                    tag,
                    representative,
                    count,
                });
            }
        }
        stories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
        debug!("Indexed {} tags over {} photos", stories.len(), photos.len());
        Ok(stories)
    }

    async fn listings(&self, query: &RowQuery) -> Result<Vec<PhotoListing>> {
        let rows = self.store.read_rows(IMAGE_TABLE, query).await?;
        let ttl = Duration::from_secs(SIGNED_URL_TTL_SECS);

        let mut listings = Vec::with_capacity(rows.len());
        for photo in rows.iter().filter_map(StoredPhoto::from_row) {
            if let Some(listing) = self.sign(&photo, ttl).await {
                listings.push(listing);
            }
        }
        Ok(listings)
    }

    async fn sign(&self, photo: &StoredPhoto, ttl: Duration) -> Option<PhotoListing> {
        match self
            .store
            .signed_url(IMAGE_BUCKET, &photo.image_path, ttl)
            .await
        {
            Ok(url) => Some(PhotoListing {
                id: photo.id,
                comfort_level: photo.comfort_level,
                position: photo.position,
                tags: photo.tags.clone(),
                url,
            }),
            Err(e) => {
                warn!("Skipping photo {}: {}", photo.id, e);
                None
            }
        }
    }
}

/// Timestamp-prefixed object name, keeping only safe filename characters
fn object_path_for(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}", Utc::now().timestamp_millis(), safe)
}

/// Form fields, CSV link and report fields as one row
fn submission_row(
    form: &CsvSubmissionForm,
    csv_path: &str,
    summary: &ValidationSummary,
) -> Result<Value> {
    let mut row = Map::new();
    let merge = |row: &mut Map<String, Value>, value: Value| -> Result<()> {
        match value {
            Value::Object(fields) => {
                row.extend(fields);
                Ok(())
            }
            _ => Err(Error::serialization("expected a JSON object")),
        }
    };

    merge(&mut row, serde_json::to_value(form)?)?;
    row.insert("csv_url".to_string(), Value::from(csv_path));
    merge(
        &mut row,
        serde_json::to_value(CsvReportRow::from_summary(summary))?,
    )?;
    Ok(Value::Object(row))
}
