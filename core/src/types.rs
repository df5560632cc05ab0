//! Domain DTOs for the property listing API.
//!
//! # Design
//! These types mirror the backend's JSON but are defined independently from
//! the mock-server crate; integration tests catch schema drift. Closed value
//! sets (property type, status, sort field, page size) are enums so a
//! `QueryState` can never hold a value the form controls could not produce.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Backend identifier of a property record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PropertyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(PropertyId)
    }
}

/// Error for a wire string outside an enum's value set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Generates a wire-string enum with `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum!(
    /// Kind of real estate.
    PropertyType, "property type" {
        Apartment => "apartment",
        House => "house",
        Villa => "villa",
        Office => "office",
        Land => "land",
    }
);

wire_enum!(
    /// Listing availability.
    PropertyStatus, "status" {
        Available => "available",
        Sold => "sold",
        Rented => "rented",
        Pending => "pending",
    }
);

impl Default for PropertyStatus {
    fn default() -> Self {
        PropertyStatus::Available
    }
}

wire_enum!(
    /// Column the server sorts the listing by.
    SortBy, "sort field" {
        CreatedAt => "created_at",
        Price => "price",
        Area => "area",
        Title => "title",
    }
);

wire_enum!(
    SortOrder, "sort order" {
        Asc => "asc",
        Desc => "desc",
    }
);

/// Allowed page sizes for the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerPage {
    Five,
    Ten,
    Twenty,
    Fifty,
}

impl PerPage {
    pub const ALL: &'static [PerPage] = &[PerPage::Five, PerPage::Ten, PerPage::Twenty, PerPage::Fifty];

    pub fn get(self) -> u32 {
        match self {
            PerPage::Five => 5,
            PerPage::Ten => 10,
            PerPage::Twenty => 20,
            PerPage::Fifty => 50,
        }
    }
}

impl TryFrom<u32> for PerPage {
    type Error = UnknownVariant;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        PerPage::ALL
            .iter()
            .copied()
            .find(|p| p.get() == value)
            .ok_or(UnknownVariant {
                kind: "page size",
                value: value.to_string(),
            })
    }
}

impl FromStr for PerPage {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s.trim().parse().map_err(|_| UnknownVariant {
            kind: "page size",
            value: s.to_string(),
        })?;
        PerPage::try_from(value)
    }
}

impl fmt::Display for PerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// A property record as returned by the listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    #[serde(deserialize_with = "number_or_string")]
    pub price: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub area: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bedrooms: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bathrooms: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub floors: u32,
    pub address: String,
    pub city: String,
    pub district: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub year_built: Option<u32>,
    pub contact_name: String,
    pub contact_phone: String,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Number(f64),
    Text(String),
}

impl RawDecimal {
    fn parse<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            RawDecimal::Number(n) => Ok(n),
            RawDecimal::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// Decimal columns may arrive as JSON numbers or as strings ("1500.00").
fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    RawDecimal::deserialize(deserializer)?.parse()
}

/// Nullable decimal column; `null` and `""` both mean absent.
fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDecimal>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawDecimal::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(raw) => raw.parse().map(Some),
    }
}

/// An image persisted for a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub id: u64,
    pub property_id: PropertyId,
    pub image_path: Option<String>,
    pub image_name: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Detail payload: a property plus its persisted images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetail {
    #[serde(flatten)]
    pub property: Property,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<PropertyImage>,
}

/// `null` reads as the type's default (zero counts, empty lists).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Server pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// Bearer token issued by `/login` and `/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_enums_parse_and_display() {
        assert_eq!("villa".parse::<PropertyType>().unwrap(), PropertyType::Villa);
        assert_eq!(SortBy::CreatedAt.to_string(), "created_at");
        let err = "castle".parse::<PropertyType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown property type `castle`");
    }

    #[test]
    fn per_page_accepts_only_known_sizes() {
        assert_eq!(PerPage::try_from(20).unwrap(), PerPage::Twenty);
        assert!(PerPage::try_from(15).is_err());
        assert_eq!("50".parse::<PerPage>().unwrap(), PerPage::Fifty);
    }

    #[test]
    fn property_accepts_decimal_strings() {
        let json = r#"{"id":3,"title":"Flat","property_type":"apartment","status":"sold",
            "price":"1250000.50","area":72,"address":"1 Main","city":"Hanoi",
            "district":"Ba Dinh","contact_name":"An","contact_phone":"0900"}"#;
        let p: Property = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, PropertyId(3));
        assert_eq!(p.price, 1_250_000.5);
        assert_eq!(p.area, 72.0);
        assert_eq!(p.bedrooms, 0);
    }

    #[test]
    fn property_tolerates_laravel_row_shapes() {
        let json = r#"{"id":8,"title":"Lake house","property_type":"house","status":"available",
            "price":"3200000000.00","area":"140.50","bedrooms":null,"bathrooms":2,"floors":null,
            "address":"9 Shore Rd","city":"Hanoi","district":"Tay Ho","postal_code":null,
            "latitude":"21.0285000","longitude":105.8542,"year_built":null,
            "contact_name":"Binh","contact_phone":"0900000009","contact_email":null}"#;
        let p: Property = serde_json::from_str(json).unwrap();
        assert_eq!(p.area, 140.5);
        assert_eq!(p.bedrooms, 0);
        assert_eq!(p.bathrooms, 2);
        assert_eq!(p.floors, 0);
        assert_eq!(p.latitude, Some(21.0285));
        assert_eq!(p.longitude, Some(105.8542));
        assert_eq!(p.year_built, None);

        let blank = json.replace(r#""latitude":"21.0285000""#, r#""latitude":"""#);
        let p: Property = serde_json::from_str(&blank).unwrap();
        assert_eq!(p.latitude, None);

        let bad = json.replace(r#""latitude":"21.0285000""#, r#""latitude":"north""#);
        assert!(serde_json::from_str::<Property>(&bad).is_err());
    }

    #[test]
    fn detail_treats_null_images_as_empty() {
        let json = r#"{"id":1,"title":"T","property_type":"land","status":"available",
            "price":1,"area":1,"address":"a","city":"c","district":"d",
            "contact_name":"n","contact_phone":"p","images":null}"#;
        let d: PropertyDetail = serde_json::from_str(json).unwrap();
        assert!(d.images.is_empty());
        assert_eq!(d.property.title, "T");
    }
}
