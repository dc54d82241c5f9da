//! Hot/cool spot annotation flow over a submitted route
//!
//! Three steps, each driven by map clicks and a note prompt: mark where it
//! felt hottest, mark where it felt coolest, then write an optional
//! narrative and any number of extra notes. Submitting writes everything to
//! the submission row in one update.

use crate::app::adapters::store::SubmissionStore;
use crate::app::models::MapPosition;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

const MISSING_MARKERS: &str = "Please place both hot and cool markers before submitting.";
const EMPTY_NOTE: &str = "Please enter a note for this location.";
const NO_PENDING_NOTE: &str = "Click the map to choose a location first.";
const NO_SUBMISSION: &str = "No submission to annotate. Please upload a CSV file first.";
const ALREADY_SUBMITTED: &str = "Annotations have already been submitted.";
const EXTRA_TOO_EARLY: &str = "Extra notes can be added after the hot and cool markers are placed.";

/// Position in the annotation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    AwaitingHotSpot,
    AwaitingCoolSpot,
    AwaitingNarrative,
    Done,
}

impl WizardStep {
    /// Instruction shown for the step
    pub fn prompt(&self) -> &'static str {
        match self {
            WizardStep::AwaitingHotSpot => "Step 1: Click the map where it felt hottest.",
            WizardStep::AwaitingCoolSpot => "Step 2: Click the map where it felt coolest.",
            WizardStep::AwaitingNarrative => {
                "Step 3: Describe your route. You can also add extra notes on the map."
            }
            WizardStep::Done => "Thank you! Your annotations were submitted.",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::AwaitingHotSpot => "awaiting hot spot",
            WizardStep::AwaitingCoolSpot => "awaiting cool spot",
            WizardStep::AwaitingNarrative => "awaiting narrative",
            WizardStep::Done => "done",
        };
        f.write_str(name)
    }
}

/// Kind of annotation marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Hot,
    Cool,
    Extra,
}

impl MarkerKind {
    pub fn name(&self) -> &'static str {
        match self {
            MarkerKind::Hot => "hot",
            MarkerKind::Cool => "cool",
            MarkerKind::Extra => "extra",
        }
    }

    /// Marker color on the map
    pub fn color(&self) -> &'static str {
        match self {
            MarkerKind::Hot => "red",
            MarkerKind::Cool => "blue",
            MarkerKind::Extra => "black",
        }
    }
}

/// A committed note at a map location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    pub note: String,
    #[serde(rename = "type")]
    pub kind: MarkerKind,
}

/// Row patch written on submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationPayload {
    pub significance: String,
    /// Hot marker, cool marker, then extras in insertion order
    pub notes: Vec<Marker>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingNote {
    position: MapPosition,
    kind: MarkerKind,
}

/// The annotation state machine for one submission
#[derive(Debug, Clone)]
pub struct AnnotationWizard {
    submission_id: Option<i64>,
    step: WizardStep,
    hot: Option<Marker>,
    cool: Option<Marker>,
    extras: Vec<Marker>,
    narrative: String,
    pending: Option<PendingNote>,
    extra_mode: bool,
}

impl AnnotationWizard {
    /// Start the flow for the submission row created at upload time
    pub fn new(submission_id: Option<i64>) -> Self {
        Self {
            submission_id,
            step: WizardStep::AwaitingHotSpot,
            hot: None,
            cool: None,
            extras: Vec::new(),
            narrative: String::new(),
            pending: None,
            extra_mode: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn submission_id(&self) -> Option<i64> {
        self.submission_id
    }

    pub fn hot_marker(&self) -> Option<&Marker> {
        self.hot.as_ref()
    }

    pub fn cool_marker(&self) -> Option<&Marker> {
        self.cool.as_ref()
    }

    pub fn extras(&self) -> &[Marker] {
        &self.extras
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    /// Kind of the open note prompt, if any
    pub fn pending_kind(&self) -> Option<MarkerKind> {
        self.pending.map(|p| p.kind)
    }

    pub fn is_adding_extra(&self) -> bool {
        self.extra_mode
    }

    /// Handle a map click
    ///
    /// Opens a note prompt for the marker the current step expects and
    /// returns its kind. In the narrative step a click only opens a prompt
    /// while extra-note mode is on; otherwise it is ignored.
    pub fn click(&mut self, position: MapPosition) -> Result<Option<MarkerKind>> {
        let kind = match self.step {
            WizardStep::AwaitingHotSpot => MarkerKind::Hot,
            WizardStep::AwaitingCoolSpot => MarkerKind::Cool,
            WizardStep::AwaitingNarrative if self.extra_mode => MarkerKind::Extra,
            WizardStep::AwaitingNarrative => return Ok(None),
            WizardStep::Done => return Err(Error::wizard_rejected(ALREADY_SUBMITTED)),
        };
        debug!(
            "Opening {:?} note prompt at ({}, {})",
            kind, position.lat, position.lng
        );
        self.pending = Some(PendingNote { position, kind });
        Ok(Some(kind))
    }

    /// Turn on extra-note mode; the next click opens an extra prompt
    pub fn begin_extra(&mut self) -> Result<()> {
        if self.step != WizardStep::AwaitingNarrative {
            return Err(Error::wizard_rejected(EXTRA_TOO_EARLY));
        }
        self.extra_mode = true;
        Ok(())
    }

    /// Commit the open prompt with a note
    ///
    /// An empty note keeps the prompt open. Committing a hot or cool marker
    /// advances the step; committing an extra leaves extra-note mode.
    pub fn submit_note(&mut self, note: &str) -> Result<&Marker> {
        let pending = self
            .pending
            .ok_or_else(|| Error::wizard_rejected(NO_PENDING_NOTE))?;
        let note = note.trim();
        if note.is_empty() {
            return Err(Error::wizard_rejected(EMPTY_NOTE));
        }
        self.pending = None;

        let marker = Marker {
            lat: pending.position.lat,
            lng: pending.position.lng,
            note: note.to_string(),
            kind: pending.kind,
        };

        let committed = match pending.kind {
            MarkerKind::Hot => {
                self.step = WizardStep::AwaitingCoolSpot;
                &*self.hot.insert(marker)
            }
            MarkerKind::Cool => {
                self.step = WizardStep::AwaitingNarrative;
                &*self.cool.insert(marker)
            }
            MarkerKind::Extra => {
                self.extra_mode = false;
                self.extras.push(marker);
                let last = self.extras.len() - 1;
                &self.extras[last]
            }
        };
        debug!("Committed {:?} marker; now {}", committed.kind, self.step);
        Ok(committed)
    }

    /// Close the open prompt without committing; the step does not change
    pub fn cancel_note(&mut self) {
        if let Some(pending) = self.pending.take() {
            if pending.kind == MarkerKind::Extra {
                self.extra_mode = false;
            }
        }
    }

    pub fn set_narrative(&mut self, narrative: impl Into<String>) {
        self.narrative = narrative.into();
    }

    /// The update that submission would write, once both markers exist
    pub fn payload(&self) -> Option<AnnotationPayload> {
        let hot = self.hot.clone()?;
        let cool = self.cool.clone()?;
        let mut notes = Vec::with_capacity(2 + self.extras.len());
        notes.push(hot);
        notes.push(cool);
        notes.extend(self.extras.iter().cloned());
        Some(AnnotationPayload {
            significance: self.narrative.clone(),
            notes,
        })
    }

    /// Write the annotations to the submission row
    ///
    /// Local rule violations are rejected before any write. The flow moves
    /// to `Done` only after the store accepts the update; on failure it stays
    /// where it was so the caller can retry.
    pub async fn submit(&mut self, store: &dyn SubmissionStore, table: &str) -> Result<()> {
        if self.step == WizardStep::Done {
            return Err(Error::wizard_rejected(ALREADY_SUBMITTED));
        }
        let payload = self
            .payload()
            .ok_or_else(|| Error::wizard_rejected(MISSING_MARKERS))?;
        let id = self
            .submission_id
            .ok_or_else(|| Error::wizard_rejected(NO_SUBMISSION))?;

        let patch = serde_json::to_value(&payload)?;
        if let Err(e) = store.update_row(table, id, patch).await {
            warn!("Annotation update for submission {} failed: {}", id, e);
            return Err(e);
        }

        self.pending = None;
        self.extra_mode = false;
        self.step = WizardStep::Done;
        info!(
            "Submitted {} annotation notes for submission {}",
            payload.notes.len(),
            id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adapters::store::{MemoryStore, RowQuery, StoreOperation};
    use serde_json::json;

    const TABLE: &str = "csv_submissions";

    fn at(lat: f64, lng: f64) -> MapPosition {
        MapPosition { lat, lng }
    }

    async fn store_with_row() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let id = store.insert_row(TABLE, json!({"name": "a"})).await.unwrap();
        (store, id)
    }

    fn place_both(wizard: &mut AnnotationWizard) {
        wizard.click(at(33.77, -84.39)).unwrap();
        wizard.submit_note("sunny").unwrap();
        wizard.click(at(33.78, -84.40)).unwrap();
        wizard.submit_note("shady").unwrap();
    }

    #[test]
    fn test_hot_click_and_confirm_advances() {
        let mut wizard = AnnotationWizard::new(Some(1));
        assert_eq!(wizard.click(at(33.77, -84.39)).unwrap(), Some(MarkerKind::Hot));
        wizard.submit_note("sunny").unwrap();

        assert_eq!(wizard.step(), WizardStep::AwaitingCoolSpot);
        let hot = wizard.hot_marker().unwrap();
        assert_eq!(hot.note, "sunny");
        assert_eq!((hot.lat, hot.lng), (33.77, -84.39));
        assert_eq!(hot.kind, MarkerKind::Hot);
    }

    #[test]
    fn test_cancel_keeps_step_without_marker() {
        let mut wizard = AnnotationWizard::new(Some(1));
        wizard.click(at(33.77, -84.39)).unwrap();
        wizard.cancel_note();

        assert_eq!(wizard.step(), WizardStep::AwaitingHotSpot);
        assert!(wizard.hot_marker().is_none());
        assert!(wizard.pending_kind().is_none());
    }

    #[test]
    fn test_empty_note_keeps_prompt_open() {
        let mut wizard = AnnotationWizard::new(Some(1));
        wizard.click(at(33.77, -84.39)).unwrap();

        let err = wizard.submit_note("   ").unwrap_err();
        assert_eq!(err.to_string(), EMPTY_NOTE);
        assert_eq!(wizard.pending_kind(), Some(MarkerKind::Hot));
        assert_eq!(wizard.step(), WizardStep::AwaitingHotSpot);
    }

    #[test]
    fn test_note_without_click_is_rejected() {
        let mut wizard = AnnotationWizard::new(Some(1));
        assert!(matches!(
            wizard.submit_note("sunny"),
            Err(Error::WizardRejected { .. })
        ));
    }

    #[test]
    fn test_extras_do_not_change_step() {
        let mut wizard = AnnotationWizard::new(Some(1));
        assert!(wizard.begin_extra().is_err());
        place_both(&mut wizard);
        assert_eq!(wizard.step(), WizardStep::AwaitingNarrative);

        // plain clicks are ignored in the narrative step
        assert_eq!(wizard.click(at(33.0, -84.0)).unwrap(), None);

        for i in 0..3 {
            wizard.begin_extra().unwrap();
            assert_eq!(
                wizard.click(at(33.0 + i as f64, -84.0)).unwrap(),
                Some(MarkerKind::Extra)
            );
            wizard.submit_note(&format!("extra {}", i)).unwrap();
            assert!(!wizard.is_adding_extra());
        }

        wizard.begin_extra().unwrap();
        wizard.click(at(34.0, -84.0)).unwrap();
        wizard.cancel_note();
        assert!(!wizard.is_adding_extra());

        assert_eq!(wizard.extras().len(), 3);
        assert_eq!(wizard.step(), WizardStep::AwaitingNarrative);
    }

    #[test]
    fn test_payload_order_and_shape() {
        let mut wizard = AnnotationWizard::new(Some(1));
        assert!(wizard.payload().is_none());
        place_both(&mut wizard);
        wizard.begin_extra().unwrap();
        wizard.click(at(33.79, -84.41)).unwrap();
        wizard.submit_note("fountain").unwrap();
        wizard.set_narrative("Walked to work");

        let json = serde_json::to_value(wizard.payload().unwrap()).unwrap();
        assert_eq!(json["significance"], "Walked to work");
        assert_eq!(json["notes"][0]["type"], "hot");
        assert_eq!(json["notes"][1]["type"], "cool");
        assert_eq!(json["notes"][2]["type"], "extra");
        assert_eq!(json["notes"][2]["note"], "fountain");
    }

    #[tokio::test]
    async fn test_submit_with_only_hot_marker_is_rejected_without_write() {
        let (store, id) = store_with_row().await;
        let writes = store.write_count().await;

        let mut wizard = AnnotationWizard::new(Some(id));
        wizard.click(at(33.77, -84.39)).unwrap();
        wizard.submit_note("sunny").unwrap();

        let err = wizard.submit(&store, TABLE).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_MARKERS);
        assert_eq!(store.write_count().await, writes);
        assert_eq!(wizard.step(), WizardStep::AwaitingCoolSpot);
    }

    #[tokio::test]
    async fn test_submit_updates_row_and_finishes() {
        let (store, id) = store_with_row().await;
        let mut wizard = AnnotationWizard::new(Some(id));
        place_both(&mut wizard);

        wizard.submit(&store, TABLE).await.unwrap();
        assert_eq!(wizard.step(), WizardStep::Done);

        let rows = store
            .read_rows(TABLE, &RowQuery::new().eq("id", id))
            .await
            .unwrap();
        assert_eq!(rows[0]["significance"], "");
        assert_eq!(rows[0]["notes"].as_array().unwrap().len(), 2);

        assert!(wizard.click(at(33.0, -84.0)).is_err());
        assert!(wizard.submit(&store, TABLE).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_update_stays_for_retry() {
        let (store, id) = store_with_row().await;
        let mut wizard = AnnotationWizard::new(Some(id));
        place_both(&mut wizard);

        store.fail(StoreOperation::Update).await;
        assert!(matches!(
            wizard.submit(&store, TABLE).await,
            Err(Error::Store { .. })
        ));
        assert_eq!(wizard.step(), WizardStep::AwaitingNarrative);

        store.clear_failures().await;
        wizard.submit(&store, TABLE).await.unwrap();
        assert_eq!(wizard.step(), WizardStep::Done);
    }

    #[tokio::test]
    async fn test_submit_requires_submission_id() {
        let store = MemoryStore::new();
        let mut wizard = AnnotationWizard::new(None);
        place_both(&mut wizard);

        let err = wizard.submit(&store, TABLE).await.unwrap_err();
        assert_eq!(err.to_string(), NO_SUBMISSION);
        assert_eq!(store.write_count().await, 0);
    }
}
