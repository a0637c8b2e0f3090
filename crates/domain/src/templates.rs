//! Built-in book template catalog.
//!
//! Templates pair a trim size with the provider's print-on-demand
//! package identifier, so a caller can go from "US Trade" to a full
//! [`BookSpecification`] with one page count.

use crate::book::{BindingType, BookSpecification, PaperType, TrimSize};
use crate::error::SpecificationError;

/// A selectable book format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookTemplate {
    /// Stable template identifier.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Short description shown at selection time.
    pub description: &'static str,
    /// Trim dimensions.
    pub trim: TrimSize,
    /// Provider POD package identifier.
    pub pod_package_id: &'static str,
}

impl BookTemplate {
    /// Builds a perfect-bound white-paper specification from this
    /// template and a page count.
    pub fn specification(&self, page_count: u32) -> Result<BookSpecification, SpecificationError> {
        BookSpecification::new(
            self.trim,
            BindingType::PerfectBound,
            PaperType::White,
            page_count,
        )
    }
}

/// The built-in template catalog.
pub const TEMPLATES: &[BookTemplate] = &[
    BookTemplate {
        id: "pocket",
        name: "Pocket Book",
        description: "4.25\" x 6.87\" - Perfect for novels and poetry",
        trim: TrimSize::POCKET,
        pod_package_id: "pocket-paperback-60-white",
    },
    BookTemplate {
        id: "a5",
        name: "A5 Standard",
        description: "5.83\" x 8.27\" - European standard size",
        trim: TrimSize::A5,
        pod_package_id: "a5-paperback-60-white",
    },
    BookTemplate {
        id: "us-trade",
        name: "US Trade",
        description: "6\" x 9\" - Most popular book size",
        trim: TrimSize::US_TRADE,
        pod_package_id: "us-trade-paperback-60-white",
    },
    BookTemplate {
        id: "business",
        name: "Business",
        description: "7\" x 10\" - Great for business books",
        trim: TrimSize::BUSINESS,
        pod_package_id: "business-paperback-60-white",
    },
    BookTemplate {
        id: "novel",
        name: "Novel",
        description: "5.5\" x 8.5\" - Classic novel format",
        trim: TrimSize::NOVEL,
        pod_package_id: "novel-paperback-60-white",
    },
];

/// Looks up a template by its identifier.
pub fn template_by_id(id: &str) -> Result<&'static BookTemplate, SpecificationError> {
    TEMPLATES
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| SpecificationError::UnknownTemplate { id: id.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_unique_ids() {
        for (i, a) in TEMPLATES.iter().enumerate() {
            for b in &TEMPLATES[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_template_by_id() {
        let template = template_by_id("us-trade").unwrap();
        assert_eq!(template.trim, TrimSize::US_TRADE);
        assert_eq!(template.pod_package_id, "us-trade-paperback-60-white");
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(
            template_by_id("folio"),
            Err(SpecificationError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn test_template_specification() {
        let spec = template_by_id("novel").unwrap().specification(320).unwrap();
        assert_eq!(spec.trim(), TrimSize::NOVEL);
        assert_eq!(spec.binding(), BindingType::PerfectBound);
        assert_eq!(spec.page_count(), 320);
    }

    #[test]
    fn test_template_specification_rejects_zero_pages() {
        assert!(template_by_id("novel").unwrap().specification(0).is_err());
    }
}
