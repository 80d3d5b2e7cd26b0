//! Core data models for author searches and harvested profiles.

mod academic;
mod profile;
mod search;

pub use academic::{Application, LanguageProficiency, LanguageTest, ProfessorProfile, UniversityProfile};
pub use profile::{PageResult, ProfileDetails, ProfileRecord, PROFILE_COLUMNS};
pub(crate) use profile::parse_count;
pub use search::{
    author_search_params, build_query_params, AuthorFilter, QueryParams, SearchQuery,
    DEFAULT_LANGUAGE, PAGE_SIZE,
};
