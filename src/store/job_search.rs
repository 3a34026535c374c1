use serde::{Deserialize, Serialize};

use super::{StateStorage, load_persisted, save_persisted};
use crate::db::models::JobListing;
use crate::types::filters::{DEFAULT_PAGE_SIZE, JobFilters, JobPage, PageParams, SortBy};

pub const JOB_SEARCH_STORAGE_KEY: &str = "job-search-store";

/// Persisted subset: the filters, the sort order and the saved job ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedJobSearch {
    search_query: String,
    location: String,
    job_type: String,
    experience_level: String,
    salary_min: Option<i32>,
    salary_max: Option<i32>,
    remote_only: bool,
    sort_by: SortBy,
    saved_jobs: Vec<i64>,
}

impl PersistedJobSearch {
    fn filters(self) -> (JobFilters, SortBy, Vec<i64>) {
        let filters = JobFilters {
            search: self.search_query,
            location: self.location,
            job_type: self.job_type,
            experience_level: self.experience_level,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            remote: self.remote_only,
        };
        (filters, self.sort_by, self.saved_jobs)
    }
}

/// Job search filters, paging and the last fetched page of results.
pub struct JobSearchStore {
    storage: Box<dyn StateStorage>,
    filters: JobFilters,
    sort_by: SortBy,
    saved_jobs: Vec<i64>,
    current_page: u32,
    page_size: u32,
    jobs: Vec<JobListing>,
    total_jobs: i64,
    total_pages: u32,
    is_loading: bool,
    error: Option<String>,
}

impl JobSearchStore {
    /// Create the store, restoring the persisted subset from `storage`.
    pub fn new(storage: Box<dyn StateStorage>) -> Self {
        let persisted: PersistedJobSearch =
            load_persisted(storage.as_ref(), JOB_SEARCH_STORAGE_KEY).unwrap_or_default();
        let (filters, sort_by, saved_jobs) = persisted.filters();
        Self {
            storage,
            filters,
            sort_by,
            saved_jobs,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            jobs: Vec::new(),
            total_jobs: 0,
            total_pages: 0,
            is_loading: false,
            error: None,
        }
    }

    pub fn search_query(&self) -> &str {
        &self.filters.search
    }

    pub fn location(&self) -> &str {
        &self.filters.location
    }

    pub fn job_type(&self) -> &str {
        &self.filters.job_type
    }

    pub fn experience_level(&self) -> &str {
        &self.filters.experience_level
    }

    pub fn salary_range(&self) -> (Option<i32>, Option<i32>) {
        (self.filters.salary_min, self.filters.salary_max)
    }

    pub fn remote_only(&self) -> bool {
        self.filters.remote
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn jobs(&self) -> &[JobListing] {
        &self.jobs
    }

    pub fn total_jobs(&self) -> i64 {
        self.total_jobs
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn saved_jobs(&self) -> &[i64] {
        &self.saved_jobs
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.update_filters(|f| f.search = query.into());
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.update_filters(|f| f.location = location.into());
    }

    pub fn set_job_type(&mut self, job_type: impl Into<String>) {
        self.update_filters(|f| f.job_type = job_type.into());
    }

    pub fn set_experience_level(&mut self, level: impl Into<String>) {
        self.update_filters(|f| f.experience_level = level.into());
    }

    pub fn set_salary_range(&mut self, min: Option<i32>, max: Option<i32>) {
        self.update_filters(|f| {
            f.salary_min = min;
            f.salary_max = max;
        });
    }

    pub fn set_remote_only(&mut self, remote: bool) {
        self.update_filters(|f| f.remote = remote);
    }

    /// Replace every filter at once.
    pub fn set_filters(&mut self, filters: JobFilters) {
        self.update_filters(|f| *f = filters);
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
        self.current_page = 1;
        self.persist();
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.is_loading = false;
    }

    /// Store a page fetched from `/api/jobs`.
    pub fn set_results(&mut self, page: JobPage) {
        self.jobs = page.jobs;
        self.total_jobs = page.total;
        self.total_pages = page.total_pages;
        self.current_page = page.page.max(1);
        self.is_loading = false;
        self.error = None;
    }

    /// Reset every filter to its empty default and go back to page 1.
    pub fn clear_filters(&mut self) {
        self.update_filters(|f| *f = JobFilters::default());
    }

    pub fn toggle_saved_job(&mut self, job_id: i64) {
        match self.saved_jobs.iter().position(|&id| id == job_id) {
            Some(pos) => {
                self.saved_jobs.remove(pos);
            }
            None => self.saved_jobs.push(job_id),
        }
        self.persist();
    }

    pub fn is_job_saved(&self, job_id: i64) -> bool {
        self.saved_jobs.contains(&job_id)
    }

    /// Current filter values.
    pub fn filters(&self) -> JobFilters {
        self.filters.clone()
    }

    pub fn has_active_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.current_page,
            limit: self.page_size,
            sort_by: self.sort_by,
        }
    }

    /// Query string for `GET /api/jobs` reflecting filters, page and sort.
    pub fn query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.filters.query_pairs() {
            serializer.append_pair(key, &value);
        }
        let params = self.page_params();
        serializer
            .append_pair("page", &params.page.to_string())
            .append_pair("limit", &params.limit.to_string())
            .append_pair("sortBy", params.sort_by.as_str());
        serializer.finish()
    }

    fn update_filters(&mut self, apply: impl FnOnce(&mut JobFilters)) {
        apply(&mut self.filters);
        self.current_page = 1;
        self.persist();
    }

    fn persist(&mut self) {
        let snapshot = PersistedJobSearch {
            search_query: self.filters.search.clone(),
            location: self.filters.location.clone(),
            job_type: self.filters.job_type.clone(),
            experience_level: self.filters.experience_level.clone(),
            salary_min: self.filters.salary_min,
            salary_max: self.filters.salary_max,
            remote_only: self.filters.remote,
            sort_by: self.sort_by,
            saved_jobs: self.saved_jobs.clone(),
        };
        save_persisted(self.storage.as_mut(), JOB_SEARCH_STORAGE_KEY, &snapshot);
    }
}
