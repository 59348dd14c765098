use thiserror::Error;

use crate::data_uri::{is_image_media_type, DataUri};
use crate::gateway::GatewayError;
use crate::notice::Notice;
use crate::ticket::{AnalysisRequest, RequestSlot, Ticket};

pub const DEFAULT_UPLOAD_LIMIT_BYTES: u64 = 5 * 1024 * 1024;

/// What the browser tells us about a dropped or picked file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub media_type: String,
    pub size: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("{name:?} is not an image ({media_type:?})")]
    NotAnImage { name: String, media_type: String },
    #[error("{name:?} is {size} bytes, over the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("no picture has been uploaded")]
    NoImage,
    #[error("the picture is already being analyzed")]
    AnalysisPending,
}

impl IntakeError {
    pub fn notice(&self) -> Notice {
        match self {
            IntakeError::NotAnImage { .. } => Notice::error("Please select an image file"),
            IntakeError::TooLarge { limit, .. } => Notice::error(format!(
                "Image is too large! Please select an image under {}",
                format_limit(*limit)
            )),
            IntakeError::NoImage => Notice::error("Upload a picture first!"),
            IntakeError::AnalysisPending => {
                Notice::info("⏳", "Still looking at your picture, hang on!")
            }
        }
    }
}

fn format_limit(limit: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const KIB: u64 = 1024;
    if limit >= MIB && limit % MIB == 0 {
        format!("{}MB", limit / MIB)
    } else if limit >= MIB {
        format!("{:.1}MB", limit as f64 / MIB as f64)
    } else if limit >= KIB {
        format!("{}KB", limit / KIB)
    } else {
        format!("{limit} bytes")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedImage {
    pub name: String,
    pub data_uri: String,
}

/// The picture panel: at most one uploaded image, a pending read, and a
/// pending analysis.
pub struct ImageIntake {
    limit: u64,
    image: Option<UploadedImage>,
    read: RequestSlot,
    reading: Option<String>,
    analysis: RequestSlot,
}

impl ImageIntake {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            image: None,
            read: RequestSlot::default(),
            reading: None,
            analysis: RequestSlot::default(),
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn is_reading(&self) -> bool {
        self.read.is_pending()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analysis.is_pending()
    }

    /// Validates `file` and starts a read. A file exactly at the limit is
    /// accepted. A newer accept supersedes a read still in flight.
    pub fn accept(&mut self, file: &FileMeta) -> Result<Ticket, IntakeError> {
        if !is_image_media_type(&file.media_type) {
            log::warn!("rejected {:?}: media type {:?}", file.name, file.media_type);
            return Err(IntakeError::NotAnImage {
                name: file.name.clone(),
                media_type: file.media_type.clone(),
            });
        }
        if file.size > self.limit {
            log::warn!(
                "rejected {:?}: {} bytes over limit {}",
                file.name,
                file.size,
                self.limit
            );
            return Err(IntakeError::TooLarge {
                name: file.name.clone(),
                size: file.size,
                limit: self.limit,
            });
        }
        self.reading = Some(file.name.clone());
        Ok(self.read.restart())
    }

    /// Completes a read started by [`ImageIntake::accept`]. Stale reads are
    /// dropped and return `None`.
    pub fn finish_read(
        &mut self,
        ticket: Ticket,
        result: Result<String, String>,
    ) -> Option<Notice> {
        if !self.read.finish(ticket) {
            log::debug!("dropping stale file read");
            return None;
        }
        let name = self.reading.take().unwrap_or_default();
        let data_uri = match result {
            Ok(data_uri) => data_uri,
            Err(reason) => {
                log::warn!("could not read {name:?}: {reason}");
                return Some(Notice::error("Sorry, I couldn't open that picture"));
            }
        };
        match DataUri::parse(&data_uri) {
            Ok(uri) if uri.is_image() => {}
            Ok(uri) => {
                log::warn!("{name:?} decoded as {:?}", uri.media_type);
                return Some(Notice::error("Please select an image file"));
            }
            Err(error) => {
                log::warn!("{name:?} did not decode to a data URI: {error}");
                return Some(Notice::error("Sorry, I couldn't open that picture"));
            }
        }
        log::info!("uploaded {name:?} ({} chars)", data_uri.len());
        self.image = Some(UploadedImage { name, data_uri });
        self.analysis.invalidate();
        Some(Notice::success("🌟", "Image uploaded successfully!"))
    }

    pub fn clear(&mut self) {
        self.image = None;
        self.reading = None;
        self.read.invalidate();
        self.analysis.invalidate();
    }

    pub fn request_analysis(&mut self) -> Result<AnalysisRequest, IntakeError> {
        let image = self.image.as_ref().ok_or(IntakeError::NoImage)?;
        let data_uri = image.data_uri.clone();
        let ticket = self
            .analysis
            .begin()
            .ok_or(IntakeError::AnalysisPending)?;
        Ok(AnalysisRequest { ticket, data_uri })
    }

    pub fn finish_analysis(
        &mut self,
        ticket: Ticket,
        result: Result<String, GatewayError>,
    ) -> Option<Notice> {
        if !self.analysis.finish(ticket) {
            log::debug!("dropping stale picture analysis");
            return None;
        }
        Some(match result {
            Ok(text) => Notice::reply(text),
            Err(error) => {
                log::warn!("picture analysis failed: {error}");
                Notice::analysis_failed()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FailureCause;
    use crate::notice::NoticeLevel;

    const LIMIT: u64 = 1024 * 1024;
    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn file(media_type: &str, size: u64) -> FileMeta {
        FileMeta {
            name: "cat.png".to_string(),
            media_type: media_type.to_string(),
            size,
        }
    }

    fn with_image() -> ImageIntake {
        let mut intake = ImageIntake::new(LIMIT);
        let ticket = intake.accept(&file("image/png", 10)).unwrap();
        intake.finish_read(ticket, Ok(PNG_URI.to_string())).unwrap();
        intake
    }

    #[test]
    fn non_images_are_rejected_without_touching_state() {
        let mut intake = with_image();
        let before = intake.image().cloned();
        let error = intake.accept(&file("application/pdf", 10)).unwrap_err();
        assert!(matches!(error, IntakeError::NotAnImage { .. }));
        assert_eq!(error.notice().text, "Please select an image file");
        assert_eq!(intake.image().cloned(), before);
        assert!(!intake.is_reading());

        assert!(intake.accept(&file("", 10)).is_err());
    }

    #[test]
    fn limit_is_inclusive() {
        let mut intake = ImageIntake::new(LIMIT);
        assert!(intake.accept(&file("image/jpeg", LIMIT)).is_ok());
        let error = intake.accept(&file("image/jpeg", LIMIT + 1)).unwrap_err();
        assert_eq!(
            error,
            IntakeError::TooLarge {
                name: "cat.png".to_string(),
                size: LIMIT + 1,
                limit: LIMIT
            }
        );
        assert_eq!(
            error.notice().text,
            "Image is too large! Please select an image under 1MB"
        );
    }

    #[test]
    fn limit_is_rendered_readably() {
        assert_eq!(format_limit(5 * 1024 * 1024), "5MB");
        assert_eq!(format_limit(1536 * 1024), "1.5MB");
        assert_eq!(format_limit(512 * 1024), "512KB");
        assert_eq!(format_limit(100), "100 bytes");
    }

    #[test]
    fn successful_read_replaces_the_image() {
        let mut intake = with_image();
        let ticket = intake.accept(&file("image/jpeg", 20)).unwrap();
        assert!(intake.is_reading());
        let notice = intake
            .finish_read(ticket, Ok("data:image/jpeg;base64,/9j/".to_string()))
            .unwrap();
        assert_eq!(notice.text, "Image uploaded successfully!");
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(intake.image().unwrap().data_uri, "data:image/jpeg;base64,/9j/");
        assert!(!intake.is_reading());
    }

    #[test]
    fn newer_accept_supersedes_a_pending_read() {
        let mut intake = ImageIntake::new(LIMIT);
        let first = intake.accept(&file("image/png", 10)).unwrap();
        let second = intake.accept(&file("image/png", 10)).unwrap();
        assert_eq!(intake.finish_read(first, Ok(PNG_URI.to_string())), None);
        assert!(intake.image().is_none());
        assert!(intake.finish_read(second, Ok(PNG_URI.to_string())).is_some());
        assert!(intake.image().is_some());
    }

    #[test]
    fn failed_or_odd_reads_keep_the_previous_image() {
        let mut intake = with_image();
        let ticket = intake.accept(&file("image/png", 10)).unwrap();
        let notice = intake.finish_read(ticket, Err("aborted".to_string())).unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(intake.image().unwrap().data_uri, PNG_URI);

        let ticket = intake.accept(&file("image/png", 10)).unwrap();
        intake
            .finish_read(ticket, Ok("data:text/plain;base64,aGk=".to_string()))
            .unwrap();
        assert_eq!(intake.image().unwrap().data_uri, PNG_URI);
    }

    #[test]
    fn clear_discards_image_and_pending_read() {
        let mut intake = with_image();
        let ticket = intake.accept(&file("image/png", 10)).unwrap();
        intake.clear();
        assert!(intake.image().is_none());
        assert_eq!(intake.finish_read(ticket, Ok(PNG_URI.to_string())), None);
        assert!(intake.image().is_none());
    }

    #[test]
    fn analysis_needs_an_image() {
        let mut intake = ImageIntake::new(LIMIT);
        assert_eq!(intake.request_analysis(), Err(IntakeError::NoImage));
    }

    #[test]
    fn analysis_round_trip() {
        let mut intake = with_image();
        let request = intake.request_analysis().unwrap();
        assert_eq!(request.data_uri, PNG_URI);
        assert!(intake.is_analyzing());
        assert_eq!(
            intake.request_analysis(),
            Err(IntakeError::AnalysisPending)
        );
        let notice = intake
            .finish_analysis(request.ticket, Ok("A sleepy cat".to_string()))
            .unwrap();
        assert_eq!(notice.text, "A sleepy cat");
        assert!(!intake.is_analyzing());
    }

    #[test]
    fn analysis_failure_returns_to_ready() {
        let mut intake = with_image();
        let request = intake.request_analysis().unwrap();
        let notice = intake
            .finish_analysis(
                request.ticket,
                Err(GatewayError::RequestFailed(FailureCause::EmptyReply)),
            )
            .unwrap();
        assert_eq!(notice, Notice::analysis_failed());
        assert!(!intake.is_analyzing());
    }

    #[test]
    fn clearing_drops_a_late_analysis() {
        let mut intake = with_image();
        let request = intake.request_analysis().unwrap();
        intake.clear();
        assert_eq!(
            intake.finish_analysis(request.ticket, Ok("late".to_string())),
            None
        );
    }
}
