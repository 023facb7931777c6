use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CSS reference pixels per inch.
const PX_PER_INCH: f64 = 96.0;
/// PDF points per inch.
pub const PT_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Paper size in inches, `(width, height)`, portrait.
    pub fn inches(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (8.27, 11.69),
            PageSize::Letter => (8.5, 11.0),
            PageSize::Legal => (8.5, 14.0),
        }
    }

    /// Paper size in PDF points, `(width, height)`.
    pub fn points(self) -> (f64, f64) {
        let (w, h) = self.inches();
        (w * PT_PER_INCH, h * PT_PER_INCH)
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => Err(format!("unknown page size '{other}'")),
        }
    }
}

/// Page margins in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(px: f64) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Margins in inches, `(top, right, bottom, left)`.
    pub fn inches(&self) -> (f64, f64, f64, f64) {
        (
            self.top / PX_PER_INCH,
            self.right / PX_PER_INCH,
            self.bottom / PX_PER_INCH,
            self.left / PX_PER_INCH,
        )
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(20.0)
    }
}

/// Print settings passed to the engine's print-to-PDF operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageOptions {
    pub page_size: PageSize,
    pub print_background: bool,
    pub margins: Margins,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            print_background: true,
            margins: Margins::default(),
        }
    }
}

impl PageOptions {
    pub fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_parses_case_insensitively() {
        assert_eq!("a4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!(" Letter ".parse::<PageSize>().unwrap(), PageSize::Letter);
        assert!("tabloid".parse::<PageSize>().is_err());
    }

    #[test]
    fn test_letter_points() {
        assert_eq!(PageSize::Letter.points(), (612.0, 792.0));
    }

    #[test]
    fn test_default_margins_are_twenty_px() {
        let (top, right, bottom, left) = PageOptions::default().margins.inches();
        let expected = 20.0 / 96.0;
        for m in [top, right, bottom, left] {
            assert!((m - expected).abs() < f64::EPSILON);
        }
    }
}
