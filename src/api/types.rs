use serde::Serialize;

use crate::db::Product;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Individual form messages when a submission fails several checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn errors(messages: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(messages.join(" ")),
            errors: Some(messages),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image: String,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            price: product.price,
            image: product.image,
        }
    }
}

/// Full-page shape for the catalog index: the grid plus the echoed query.
#[derive(Debug, Serialize)]
pub struct IndexPageDto {
    pub products: Vec<ProductDto>,
    pub query: String,
}

/// Fragment shape returned to asynchronous refresh calls: the grid only.
#[derive(Debug, Serialize)]
pub struct ProductGridDto {
    pub products: Vec<ProductDto>,
}

/// Shell for the informational pages; rendering happens client-side.
#[derive(Debug, Serialize)]
pub struct PageDto {
    pub slug: &'static str,
    pub title: &'static str,
}
