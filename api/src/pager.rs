//! Past predictions are paged by match number, walking backward from the most
//! recently completed fixture.

use crate::Prediction;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Inclusive range of match numbers to request for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchWindow {
    pub min: u32,
    pub max: u32,
}

impl MatchWindow {
    pub fn contains(&self, match_num: u32) -> bool {
        (self.min..=self.max).contains(&match_num)
    }

    /// True when no page can precede this one.
    pub fn reaches_floor(&self) -> bool {
        self.min <= 1
    }
}

/// Window for `page_number` (1-based). `None` once the window falls below
/// match 1, which callers treat as end-of-data.
pub fn page(last_completed_match_num: u32, page_number: u32, page_size: u32) -> Option<MatchWindow> {
    if page_size == 0 {
        return None;
    }
    let skipped = i128::from(page_number.max(1) - 1) * i128::from(page_size);
    let max = i128::from(last_completed_match_num) - skipped;
    if max < 1 {
        return None;
    }
    let min = (max - i128::from(page_size) + 1).max(1);
    Some(MatchWindow {
        min: min as u32,
        max: max as u32,
    })
}

/// One loaded page of past predictions.
#[derive(Debug, Clone, Default)]
pub struct PastPredictionsPage {
    pub page_number: u32,
    pub window: Option<MatchWindow>,
    pub predictions: Vec<Prediction>,
    pub has_more: bool,
}

impl PastPredictionsPage {
    pub fn end_of_data(page_number: u32) -> Self {
        Self {
            page_number,
            window: None,
            predictions: Vec::new(),
            has_more: false,
        }
    }

    /// A short page, or one whose window already touches match 1, is the last.
    pub fn from_window(
        page_number: u32,
        page_size: u32,
        window: MatchWindow,
        predictions: Vec<Prediction>,
    ) -> Self {
        let has_more = predictions.len() >= page_size as usize && !window.reaches_floor();
        Self {
            page_number,
            window: Some(window),
            predictions,
            has_more,
        }
    }
}
