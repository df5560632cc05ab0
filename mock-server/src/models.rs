use serde::{Deserialize, Serialize};

pub const PROPERTY_TYPES: &[&str] = &["apartment", "house", "villa", "office", "land"];
pub const STATUSES: &[&str] = &["available", "sold", "rented", "pending"];
pub const SORT_FIELDS: &[&str] = &["created_at", "price", "area", "title"];

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub property_type: String,
    pub status: String,
    pub price: f64,
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub floors: u32,
    pub address: String,
    pub city: String,
    pub district: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PropertyImage {
    pub id: u64,
    pub property_id: u64,
    pub image_path: Option<String>,
    pub image_name: String,
    pub is_primary: bool,
    pub sort_order: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    pub images: Vec<PropertyImage>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Listing query. Every field is optional; an empty string is a literal
/// filter value, not "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Deserialize)]
pub struct MethodOverride {
    #[serde(rename = "_method")]
    pub method: Option<String>,
}

/// An uploaded file from a multipart submission.
#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Raw multipart submission for create/update.
#[derive(Debug, Default)]
pub struct PropertySubmission {
    pub fields: std::collections::HashMap<String, String>,
    pub images: Vec<Upload>,
    pub existing_images: Vec<u64>,
}

/// Validated scalar fields of a submission.
#[derive(Debug, Clone)]
pub struct PropertyInput {
    pub title: String,
    pub description: Option<String>,
    pub property_type: String,
    pub status: String,
    pub price: f64,
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub floors: u32,
    pub address: String,
    pub city: String,
    pub district: String,
    pub contact_name: String,
    pub contact_phone: String,
}
