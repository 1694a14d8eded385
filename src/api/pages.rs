//! Informational page shells. Rendering is the frontend's job; these just
//! name the page so the route surface matches the site map.

use axum::Json;

use super::{ApiResponse, PageDto};

const fn page(slug: &'static str, title: &'static str) -> ApiResponse<PageDto> {
    ApiResponse::success(PageDto { slug, title })
}

/// GET /services
pub async fn services() -> Json<ApiResponse<PageDto>> {
    Json(page("services", "Our Services"))
}

/// GET /help
pub async fn help() -> Json<ApiResponse<PageDto>> {
    Json(page("help", "Help Center"))
}

/// GET /contact-us
pub async fn contact_us() -> Json<ApiResponse<PageDto>> {
    Json(page("contact-us", "Contact Us"))
}

/// GET /about
pub async fn about() -> Json<ApiResponse<PageDto>> {
    Json(page("about", "About Us"))
}

/// GET /terms-of-use
pub async fn terms_of_use() -> Json<ApiResponse<PageDto>> {
    Json(page("terms-of-use", "Terms of Use"))
}

/// GET /privacy-policy
pub async fn privacy() -> Json<ApiResponse<PageDto>> {
    Json(page("privacy-policy", "Privacy Policy"))
}

/// GET /return
pub async fn return_policy() -> Json<ApiResponse<PageDto>> {
    Json(page("return", "Return Policy"))
}

/// GET /warranty
pub async fn warranty() -> Json<ApiResponse<PageDto>> {
    Json(page("warranty", "Warranty"))
}
