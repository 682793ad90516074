/// Product record definitions
///
/// A `ProductRecord` is the unit handed to the output sink. It is built once
/// by the coordinator's merge step and never modified after that.
use std::fmt;
use thiserror::Error;

/// Stock status derived from a controlled availability vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    InStock,
    OutOfStock,
    /// The code was absent or not in the vocabulary
    Unknown,
}

impl Availability {
    /// Maps a schema.org availability code to a stock status
    ///
    /// Accepts bare codes (`InStock`) as well as IRIs
    /// (`https://schema.org/InStock`, `http://schema.org/OutOfStock`).
    /// Matching ignores case.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        let code = code.rsplit('/').next().unwrap_or(code).to_ascii_lowercase();

        match code.as_str() {
            "instock" | "limitedavailability" | "onlineonly" | "instoreonly" => Self::InStock,
            "outofstock" | "soldout" | "discontinued" | "preorder" | "backorder" | "presale" => {
                Self::OutOfStock
            }
            _ => Self::Unknown,
        }
    }

    /// Unknown availability counts as not in stock
    pub fn is_in_stock(&self) -> bool {
        matches!(self, Self::InStock)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A record failed validation and must not be emitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record for {link} has no title")]
    MissingTitle { link: String },
}

/// The final output unit of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub title: String,
    /// Raw currency-formatted text; may be empty
    pub price: String,
    pub link: String,
    /// Path between catalog root and product; may be empty
    pub category: String,
    pub image: Option<String>,
    pub description: Option<String>,
    /// `None` when availability was not requested
    pub availability: Option<Availability>,
}

impl ProductRecord {
    /// Creates a record with the required fields, rejecting an empty title
    pub fn new(
        title: impl Into<String>,
        price: impl Into<String>,
        link: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let title = title.into();
        let link = link.into();

        if title.trim().is_empty() {
            return Err(RecordError::MissingTitle { link });
        }

        Ok(Self {
            title,
            price: price.into(),
            link,
            category: String::new(),
            image: None,
            description: None,
            availability: None,
        })
    }

    /// Stock flag for output; `None` when availability was not requested
    pub fn in_stock(&self) -> Option<bool> {
        self.availability.map(|a| a.is_in_stock())
    }
}
