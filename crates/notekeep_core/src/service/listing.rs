//! Listing request normalization and page envelope.
//!
//! # Invariants
//! - `size` defaults to 20 and clamps to `1..=100`.
//! - `page` is zero-based; pages past the end are empty, not errors.
//! - Missing sort means `createdOn DESC`.

use crate::model::note::Note;
use crate::repo::note_repo::{SortOrder, SortParseError};

pub const PAGE_SIZE_DEFAULT: u32 = 20;
pub const PAGE_SIZE_MAX: u32 = 100;

/// Caller-supplied pagination parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: Option<u32>,
    pub sort: Option<SortOrder>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: Some(size),
            sort: None,
        }
    }

    /// Builds a request from raw query parameters.
    pub fn parse(
        page: Option<u32>,
        size: Option<u32>,
        sort: Option<&str>,
    ) -> Result<Self, SortParseError> {
        let sort = sort
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(SortOrder::parse)
            .transpose()?;
        Ok(Self {
            page: page.unwrap_or(0),
            size,
            sort,
        })
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Effective page size after defaulting and clamping.
    pub fn applied_size(&self) -> u32 {
        normalize_page_size(self.size)
    }

    /// Effective sort order.
    pub fn applied_sort(&self) -> SortOrder {
        self.sort.unwrap_or_default()
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.applied_size())
    }
}

/// Normalizes page size according to the listing contract.
pub fn normalize_page_size(size: Option<u32>) -> u32 {
    match size {
        Some(0) | None => PAGE_SIZE_DEFAULT,
        Some(value) if value > PAGE_SIZE_MAX => PAGE_SIZE_MAX,
        Some(value) => value,
    }
}

/// One page of notes from the caller's visible set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePage {
    pub items: Vec<Note>,
    pub page: u32,
    pub size: u32,
    /// Total notes in the caller's scope, across all pages.
    pub total: u64,
}

impl NotePage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size))
    }
}
