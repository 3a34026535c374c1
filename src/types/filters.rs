use serde::{Deserialize, Serialize};

use crate::db::models::JobListing;

/// Job search filters, shared by the search store and the `/api/jobs` query string.
///
/// Empty strings, `None` and `false` mean "not filtering on this field".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobFilters {
    pub search: String,
    pub location: String,
    pub job_type: String,
    pub experience_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i32>,
    pub remote: bool,
}

impl JobFilters {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.location.trim().is_empty()
            && self.job_type.trim().is_empty()
            && self.experience_level.trim().is_empty()
            && self.salary_min.is_none()
            && self.salary_max.is_none()
            && !self.remote
    }

    /// Non-empty filters as query pairs, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let texts = [
            ("search", &self.search),
            ("location", &self.location),
            ("jobType", &self.job_type),
            ("experienceLevel", &self.experience_level),
        ];
        for (key, value) in texts {
            let value = value.trim();
            if !value.is_empty() {
                pairs.push((key, value.to_string()));
            }
        }
        if let Some(min) = self.salary_min {
            pairs.push(("salaryMin", min.to_string()));
        }
        if let Some(max) = self.salary_max {
            pairs.push(("salaryMax", max.to_string()));
        }
        if self.remote {
            pairs.push(("remote", "true".to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Newest,
    SalaryHigh,
    SalaryLow,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::SalaryHigh => "salary_high",
            Self::SalaryLow => "salary_low",
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Paging and ordering half of the `/api/jobs` query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortBy,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: SortBy::Newest,
        }
    }
}

impl PageParams {
    /// Clamp page to >= 1 and limit to 1..=MAX_PAGE_SIZE.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
            sort_by: self.sort_by,
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub jobs: Vec<JobListing>,
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

impl JobPage {
    pub fn new(jobs: Vec<JobListing>, total: i64, params: PageParams) -> Self {
        let limit = i64::from(params.limit.max(1));
        let total_pages = ((total.max(0) + limit - 1) / limit) as u32;
        Self {
            jobs,
            total,
            page: params.page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_filters_are_empty() {
        let filters = JobFilters {
            search: "   ".to_string(),
            ..JobFilters::default()
        };
        assert!(filters.is_empty());
        assert!(filters.query_pairs().is_empty());
    }

    #[test]
    fn query_pairs_skip_unset_fields() {
        let filters = JobFilters {
            search: " rust ".to_string(),
            salary_min: Some(100_000),
            remote: true,
            ..JobFilters::default()
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("search", "rust".to_string()),
                ("salaryMin", "100000".to_string()),
                ("remote", "true".to_string()),
            ]
        );
    }

    #[test]
    fn page_params_are_clamped() {
        let params = PageParams {
            page: 0,
            limit: 500,
            sort_by: SortBy::SalaryLow,
        }
        .normalized();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let third = PageParams {
            page: 3,
            limit: 10,
            sort_by: SortBy::Newest,
        };
        assert_eq!(third.offset(), 20);
    }

    #[test]
    fn total_pages_round_up() {
        let params = PageParams::default();
        assert_eq!(JobPage::new(Vec::new(), 0, params).total_pages, 0);
        assert_eq!(JobPage::new(Vec::new(), 10, params).total_pages, 1);
        assert_eq!(JobPage::new(Vec::new(), 11, params).total_pages, 2);
    }
}
