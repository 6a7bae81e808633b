use serde::Serialize;

use super::{Colour, Font, Path, Stroke, Surface};
use crate::geom::Point2;
use crate::geom::polygon::{closest_point_on_segment, point_in_polygon};

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DrawCommand {
    Fill {
        path: Path,
        colour: Colour,
        #[serde(skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
    },
    Stroke {
        path: Path,
        stroke: Stroke,
        #[serde(skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
    },
    Text {
        origin: Point2,
        text: String,
        font: Font,
        colour: Colour,
        #[serde(skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
    },
}

impl DrawCommand {
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Fill { tag, .. } | Self::Stroke { tag, .. } | Self::Text { tag, .. } => {
                tag.as_deref()
            }
        }
    }

    fn contains(&self, point: Point2) -> bool {
        match self {
            Self::Fill { path, .. } => path
                .flatten()
                .iter()
                .any(|(ring, _)| ring.len() >= 3 && point_in_polygon(point, ring)),
            Self::Stroke { path, stroke, .. } => {
                let half = (stroke.thickness * 0.5).max(0.0);
                path.flatten().iter().any(|(line, closed)| {
                    let segment_count = if *closed { line.len() } else { line.len().saturating_sub(1) };
                    (0..segment_count).any(|i| {
                        let a = line[i];
                        let b = line[(i + 1) % line.len()];
                        closest_point_on_segment(point, a, b).distance_squared_to(point) <= half * half
                    })
                })
            }
            // Text has no metrics at this level.
            Self::Text { .. } => false,
        }
    }
}

/// A recorded 2D drawing sized to a camera's view rectangle.
///
/// Coordinates of the recorded commands are camera-plane coordinates; `origin`
/// is the top-left corner of the visible window in those coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    origin: Point2,
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl Page {
    #[must_use]
    pub fn new(origin: Point2, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub const fn origin(&self) -> Point2 {
        self.origin
    }

    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Tag of the top-most shape under `point`.
    ///
    /// An untagged shape on top hides tagged shapes below it.
    #[must_use]
    pub fn hit_test(&self, point: Point2) -> Option<&str> {
        self.commands
            .iter()
            .rev()
            .find(|command| command.contains(point))
            .and_then(DrawCommand::tag)
    }
}

impl Surface for Page {
    fn fill_path(&mut self, path: &Path, colour: Colour, tag: Option<&str>) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            colour,
            tag: tag.map(str::to_owned),
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &Stroke, tag: Option<&str>) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            stroke: stroke.clone(),
            tag: tag.map(str::to_owned),
        });
    }

    fn fill_text(&mut self, origin: Point2, text: &str, font: &Font, colour: Colour, tag: Option<&str>) {
        self.commands.push(DrawCommand::Text {
            origin,
            text: text.to_owned(),
            font: font.clone(),
            colour,
            tag: tag.map(str::to_owned),
        });
    }
}
