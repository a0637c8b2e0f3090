//! Book specification value objects.

use serde::{Deserialize, Serialize};

use crate::error::SpecificationError;

/// Trim dimensions in thousandths of an inch (mils).
///
/// Stored as integers so specifications stay hash- and
/// equality-comparable; 6" x 9" is `TrimSize::new(6_000, 9_000)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrimSize {
    width_mils: u32,
    height_mils: u32,
}

impl TrimSize {
    /// 4.25" x 6.87" pocket book.
    pub const POCKET: TrimSize = TrimSize {
        width_mils: 4_250,
        height_mils: 6_870,
    };

    /// 5.83" x 8.27" European A5.
    pub const A5: TrimSize = TrimSize {
        width_mils: 5_830,
        height_mils: 8_270,
    };

    /// 5.5" x 8.5" classic novel format.
    pub const NOVEL: TrimSize = TrimSize {
        width_mils: 5_500,
        height_mils: 8_500,
    };

    /// 6" x 9" US trade, the most common book size.
    pub const US_TRADE: TrimSize = TrimSize {
        width_mils: 6_000,
        height_mils: 9_000,
    };

    /// 7" x 10" business format.
    pub const BUSINESS: TrimSize = TrimSize {
        width_mils: 7_000,
        height_mils: 10_000,
    };

    /// Creates a trim size from width and height in mils.
    pub fn new(width_mils: u32, height_mils: u32) -> Result<Self, SpecificationError> {
        if width_mils == 0 || height_mils == 0 {
            return Err(SpecificationError::InvalidTrim {
                width_mils,
                height_mils,
            });
        }
        Ok(Self {
            width_mils,
            height_mils,
        })
    }

    /// Width in mils.
    pub fn width_mils(&self) -> u32 {
        self.width_mils
    }

    /// Height in mils.
    pub fn height_mils(&self) -> u32 {
        self.height_mils
    }
}

impl std::fmt::Display for TrimSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_inches = |f: &mut std::fmt::Formatter<'_>, mils: u32| {
            if mils % 1_000 == 0 {
                write!(f, "{}\"", mils / 1_000)
            } else {
                let mut frac = mils % 1_000;
                let mut width = 3;
                while frac % 10 == 0 {
                    frac /= 10;
                    width -= 1;
                }
                write!(f, "{}.{:0w$}\"", mils / 1_000, frac, w = width)
            }
        };
        fmt_inches(f, self.width_mils)?;
        write!(f, " x ")?;
        fmt_inches(f, self.height_mils)
    }
}

/// How the book block is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BindingType {
    /// Glued paperback spine. The pricing fallback for any binding
    /// without a configured rate.
    #[default]
    PerfectBound,

    /// Folded and stapled; short documents only.
    SaddleStitch,

    /// Case-bound hardcover.
    Hardcover,
}

impl BindingType {
    /// Returns the binding name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingType::PerfectBound => "perfect_bound",
            BindingType::SaddleStitch => "saddle_stitch",
            BindingType::Hardcover => "hardcover",
        }
    }
}

impl std::fmt::Display for BindingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interior paper stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    /// 60# standard white.
    #[default]
    White,

    /// 60# cream.
    Cream,

    /// 80# premium white.
    PremiumWhite,

    /// Recycled white stock.
    Recycled,
}

impl PaperType {
    /// Returns the paper name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperType::White => "white",
            PaperType::Cream => "cream",
            PaperType::PremiumWhite => "premium_white",
            PaperType::Recycled => "recycled",
        }
    }
}

impl std::fmt::Display for PaperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable book specification.
///
/// Created at template-selection time and never mutated; a change in
/// any dimension produces a new specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookSpecification {
    trim: TrimSize,
    binding: BindingType,
    paper: PaperType,
    page_count: u32,
}

impl BookSpecification {
    /// Creates a new specification, rejecting a zero page count.
    pub fn new(
        trim: TrimSize,
        binding: BindingType,
        paper: PaperType,
        page_count: u32,
    ) -> Result<Self, SpecificationError> {
        if page_count == 0 {
            return Err(SpecificationError::InvalidPageCount { page_count });
        }
        Ok(Self {
            trim,
            binding,
            paper,
            page_count,
        })
    }

    /// The trim dimensions.
    pub fn trim(&self) -> TrimSize {
        self.trim
    }

    /// The binding type.
    pub fn binding(&self) -> BindingType {
        self.binding
    }

    /// The interior paper stock.
    pub fn paper(&self) -> PaperType {
        self.paper
    }

    /// The interior page count.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }
}

impl std::fmt::Display for BookSpecification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} on {}, {} pages",
            self.trim, self.binding, self.paper, self.page_count
        )
    }
}
