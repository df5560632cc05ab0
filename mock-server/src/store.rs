//! In-memory state behind the mock API: users, issued tokens, properties and
//! their images (bytes kept so `/storage` can serve them back).

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::models::{
    ListParams, Page, Property, PropertyDetail, PropertyImage, PropertyInput, PropertySubmission,
    Upload, PROPERTY_TYPES, SORT_FIELDS, STATUSES,
};

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

#[derive(Clone, Debug)]
struct User {
    name: String,
    password: String,
}

#[derive(Clone, Debug)]
pub struct StoredFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Store {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    properties: BTreeMap<u64, Property>,
    images: BTreeMap<u64, Vec<PropertyImage>>,
    files: HashMap<String, StoredFile>,
    next_property_id: u64,
    next_image_id: u64,
}

/// Fixed-width timestamps so `created_at` sorts correctly as a string.
fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

impl Store {
    /// A store with one admin account and a handful of listings.
    pub fn with_demo_data() -> Self {
        let mut store = Store::default();
        store.add_user("Admin", "admin@example.com", "secret123");
        let seed = [
            ("Riverside apartment", "apartment", "available", 2_500_000_000.0, 80.0, "Hanoi", "Ba Dinh"),
            ("Garden house", "house", "available", 5_200_000_000.0, 150.0, "Hanoi", "Tay Ho"),
            ("Beach villa", "villa", "pending", 12_000_000_000.0, 320.0, "Da Nang", "Son Tra"),
            ("City office floor", "office", "rented", 900_000_000.0, 210.0, "HCMC", "District 1"),
            ("Suburban plot", "land", "sold", 1_800_000_000.0, 500.0, "HCMC", "Thu Duc"),
            ("Studio near lake", "apartment", "available", 1_200_000_000.0, 35.0, "Hanoi", "Hoan Kiem"),
        ];
        for (title, property_type, status, price, area, city, district) in seed {
            store.insert_property(PropertyInput {
                title: title.to_string(),
                description: None,
                property_type: property_type.to_string(),
                status: status.to_string(),
                price,
                area,
                bedrooms: 2,
                bathrooms: 1,
                floors: 1,
                address: format!("{} street", district),
                city: city.to_string(),
                district: district.to_string(),
                contact_name: "Sales desk".to_string(),
                contact_phone: "0900000000".to_string(),
            });
        }
        store
    }

    pub fn add_user(&mut self, name: &str, email: &str, password: &str) {
        self.users.insert(
            email.to_lowercase(),
            User {
                name: name.to_string(),
                password: password.to_string(),
            },
        );
    }

    pub fn display_name(&self, email: &str) -> Option<&str> {
        self.users.get(&email.to_lowercase()).map(|u| u.name.as_str())
    }

    pub fn has_user(&self, email: &str) -> bool {
        self.users.contains_key(&email.to_lowercase())
    }

    /// Issue a token when the credentials match.
    pub fn login(&mut self, email: &str, password: &str) -> Option<String> {
        let email = email.to_lowercase();
        let user = self.users.get(&email)?;
        if user.password != password {
            return None;
        }
        Some(self.issue_token(email))
    }

    pub fn issue_token(&mut self, email: String) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), email);
        token
    }

    pub fn is_valid_token(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn insert_property(&mut self, input: PropertyInput) -> Property {
        self.next_property_id += 1;
        let ts = now();
        let property = Property {
            id: self.next_property_id,
            title: input.title,
            description: input.description,
            property_type: input.property_type,
            status: input.status,
            price: input.price,
            area: input.area,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            floors: input.floors,
            address: input.address,
            city: input.city,
            district: input.district,
            contact_name: input.contact_name,
            contact_phone: input.contact_phone,
            created_at: ts.clone(),
            updated_at: ts,
        };
        self.properties.insert(property.id, property.clone());
        property
    }

    pub fn update_property(&mut self, id: u64, input: PropertyInput) -> Option<Property> {
        let property = self.properties.get_mut(&id)?;
        property.title = input.title;
        property.description = input.description;
        property.property_type = input.property_type;
        property.status = input.status;
        property.price = input.price;
        property.area = input.area;
        property.bedrooms = input.bedrooms;
        property.bathrooms = input.bathrooms;
        property.floors = input.floors;
        property.address = input.address;
        property.city = input.city;
        property.district = input.district;
        property.contact_name = input.contact_name;
        property.contact_phone = input.contact_phone;
        property.updated_at = now();
        Some(property.clone())
    }

    pub fn delete_property(&mut self, id: u64) -> bool {
        if self.properties.remove(&id).is_none() {
            return false;
        }
        for image in self.images.remove(&id).unwrap_or_default() {
            if let Some(path) = image.image_path {
                self.files.remove(&path);
            }
        }
        true
    }

    pub fn detail(&self, id: u64) -> Option<PropertyDetail> {
        let property = self.properties.get(&id)?.clone();
        let images = self.images.get(&id).cloned().unwrap_or_default();
        Some(PropertyDetail { property, images })
    }

    /// Drop images not listed in `keep` and append `uploads`.
    pub fn sync_images(&mut self, property_id: u64, keep: Option<&[u64]>, uploads: Vec<Upload>) {
        let mut current = self.images.remove(&property_id).unwrap_or_default();
        if let Some(keep) = keep {
            let (kept, dropped): (Vec<_>, Vec<_>) =
                current.into_iter().partition(|img| keep.contains(&img.id));
            for image in dropped {
                if let Some(path) = image.image_path {
                    self.files.remove(&path);
                }
            }
            current = kept;
        }
        for upload in uploads {
            self.next_image_id += 1;
            let path = format!(
                "properties/{property_id}/{}-{}",
                Uuid::new_v4().simple(),
                upload.file_name
            );
            let ts = now();
            self.files.insert(
                path.clone(),
                StoredFile {
                    content_type: upload.content_type,
                    bytes: upload.bytes,
                },
            );
            current.push(PropertyImage {
                id: self.next_image_id,
                property_id,
                image_path: Some(path),
                image_name: upload.file_name,
                is_primary: false,
                sort_order: 0,
                created_at: ts.clone(),
                updated_at: ts,
            });
        }
        for (i, image) in current.iter_mut().enumerate() {
            image.sort_order = i as u32;
            image.is_primary = i == 0;
        }
        self.images.insert(property_id, current);
    }

    pub fn file(&self, path: &str) -> Option<&StoredFile> {
        self.files.get(path)
    }

    /// Filter, sort and paginate. Rejects unknown sort fields and orders.
    pub fn list(&self, params: &ListParams) -> Result<Page<Property>, (String, String)> {
        let sort_by = params.sort_by.as_deref().unwrap_or("created_at");
        if !SORT_FIELDS.contains(&sort_by) {
            return Err(("sort_by".into(), "The selected sort_by is invalid.".into()));
        }
        let descending = match params.order.as_deref().unwrap_or("desc") {
            "desc" => true,
            "asc" => false,
            _ => return Err(("order".into(), "The selected order is invalid.".into())),
        };
        let per_page = params
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = params.page.unwrap_or(1).max(1);

        let search = params.search.as_ref().map(|s| s.to_lowercase());
        let city = params.city.as_ref().map(|s| s.to_lowercase());
        let mut rows: Vec<&Property> = self
            .properties
            .values()
            .filter(|p| match &search {
                Some(s) => p.title.to_lowercase().contains(s.as_str()),
                None => true,
            })
            .filter(|p| match &city {
                Some(c) => p.city.to_lowercase().contains(c.as_str()),
                None => true,
            })
            .filter(|p| match &params.property_type {
                Some(t) => &p.property_type == t,
                None => true,
            })
            .filter(|p| match &params.status {
                Some(s) => &p.status == s,
                None => true,
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = compare(a, b, sort_by).then(a.id.cmp(&b.id));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });

        let total = rows.len() as u64;
        let last_page = (total.div_ceil(per_page as u64)).max(1) as u32;
        let start = ((page - 1) as usize).saturating_mul(per_page as usize);
        let data = rows
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();

        Ok(Page {
            data,
            current_page: page,
            last_page,
            per_page,
            total,
        })
    }
}

fn compare(a: &Property, b: &Property, field: &str) -> Ordering {
    match field {
        "price" => a.price.total_cmp(&b.price),
        "area" => a.area.total_cmp(&b.area),
        "title" => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        _ => a.created_at.cmp(&b.created_at),
    }
}

/// Validate a multipart submission into `PropertyInput`, collecting
/// Laravel-style per-field messages.
pub fn validate_submission(
    submission: &PropertySubmission,
) -> Result<PropertyInput, BTreeMap<String, Vec<String>>> {
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let field = |name: &str| {
        submission
            .fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };
    let required = |name: &str, errors: &mut BTreeMap<String, Vec<String>>| {
        let value = field(name);
        if value.is_empty() {
            errors
                .entry(name.to_string())
                .or_default()
                .push(format!("The {} field is required.", name.replace('_', " ")));
        }
        value
    };

    let title = required("title", &mut errors);
    let address = required("address", &mut errors);
    let city = required("city", &mut errors);
    let district = required("district", &mut errors);
    let contact_name = required("contact_name", &mut errors);
    let contact_phone = required("contact_phone", &mut errors);

    let property_type = field("property_type");
    if !PROPERTY_TYPES.contains(&property_type.as_str()) {
        errors
            .entry("property_type".into())
            .or_default()
            .push("The selected property type is invalid.".into());
    }
    let mut status = field("status");
    if status.is_empty() {
        status = "available".into();
    }
    if !STATUSES.contains(&status.as_str()) {
        errors
            .entry("status".into())
            .or_default()
            .push("The selected status is invalid.".into());
    }

    let mut number = |name: &str| -> f64 {
        match field(name).parse::<f64>() {
            Ok(n) if n >= 0.0 && n.is_finite() => n,
            _ => {
                errors
                    .entry(name.to_string())
                    .or_default()
                    .push(format!("The {name} must be a non-negative number."));
                0.0
            }
        }
    };
    let price = number("price");
    let area = number("area");

    let count = |name: &str| field(name).parse::<u32>().unwrap_or(0);
    let description = Some(field("description")).filter(|d| !d.is_empty());

    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(PropertyInput {
        title,
        description,
        property_type,
        status,
        price,
        area,
        bedrooms: count("bedrooms"),
        bathrooms: count("bathrooms"),
        floors: count("floors"),
        address,
        city,
        district,
        contact_name,
        contact_phone,
    })
}
