use std::sync::Arc;

use crate::application::blog::BlogService;
use crate::application::featured::FeaturedService;
use crate::application::search::SearchService;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub featured: Arc<FeaturedService>,
    pub search: Arc<SearchService>,
    pub blog: Arc<BlogService>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}
