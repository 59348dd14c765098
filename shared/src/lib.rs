use serde::{Deserialize, Serialize};

pub mod brush;
pub mod config;
pub mod conversation;
pub mod data_uri;
pub mod gateway;
pub mod geometry;
pub mod intake;
pub mod notice;
pub mod particles;
pub mod raster;
pub mod shell;
pub mod surface;
pub mod ticket;

pub use brush::{BrushConfig, BrushWidth, Color};
pub use config::AppConfig;
pub use conversation::{Conversation, Message};
pub use gateway::{Gateway, GatewayError, Transport};
pub use intake::{FileMeta, ImageIntake, IntakeError};
pub use notice::Notice;
pub use raster::RasterBuffer;
pub use shell::{Shell, Tab};
pub use surface::{DrawingSurface, SurfaceError};
pub use ticket::Ticket;

/// A position in raster buffer space.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}
