use serde::Serialize;

use super::catalog::CatalogKind;
use super::inquiry::{Inquiry, InquiryStatus};

/// Number of entries in each catalog collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub seasonal: i64,
    pub tech: i64,
    pub organic: i64,
    pub stories: i64,
}

impl CatalogCounts {
    pub fn set(&mut self, kind: CatalogKind, count: i64) {
        match kind {
            CatalogKind::Seasonal => self.seasonal = count,
            CatalogKind::Tech => self.tech = count,
            CatalogKind::Organic => self.organic = count,
            CatalogKind::Story => self.stories = count,
        }
    }
}

/// Inquiry totals by follow-up status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InquiryCounts {
    pub total: i64,
    pub new: i64,
    pub contacted: i64,
    pub closed: i64,
}

impl InquiryCounts {
    pub fn add(&mut self, status: InquiryStatus, count: i64) {
        self.total += count;
        match status {
            InquiryStatus::New => self.new += count,
            InquiryStatus::Contacted => self.contacted += count,
            InquiryStatus::Closed => self.closed += count,
        }
    }
}

/// Back-office landing page figures.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub catalog: CatalogCounts,
    pub inquiries: InquiryCounts,
    pub recent_inquiries: Vec<Inquiry>,
}
