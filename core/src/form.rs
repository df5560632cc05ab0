//! Create/edit form controller for a property record.
//!
//! # Design
//! Scalar inputs are held as the user typed them (`price` and `area` are text
//! until validated) and converted only when a submission is built. Images are
//! tracked as two parallel lists:
//!
//! - `existing_images`: persisted on the server, identified by id; the ids
//!   still present at submit time are sent as `existing_images[]` so the
//!   backend keeps them.
//! - `new_images`: local files attached in this session, sent as `images[]`.
//!
//! Create and edit share one multipart payload shape; edit targets the record
//! with a POST carrying the `_method=PUT` override.

use tracing::debug;
use validator::Validate;

use crate::assets::AssetUrls;
use crate::auth::field_errors;
use crate::client::ApiClient;
use crate::error::{ApiError, FieldErrors, FormError, GENERIC_ERROR_MESSAGE};
use crate::http::{FileUpload, HttpRequest, HttpResponse, MultipartForm};
use crate::types::{Property, PropertyDetail, PropertyId, PropertyImage, PropertyStatus, PropertyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(PropertyId),
}

/// Scalar inputs of the property form.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct PropertyFields {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub property_type: Option<PropertyType>,
    pub status: PropertyStatus,
    pub price: String,
    pub area: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "District is required"))]
    pub district: String,
    #[validate(length(min = 1, message = "Contact name is required"))]
    pub contact_name: String,
    #[validate(length(min = 1, message = "Contact phone is required"))]
    pub contact_phone: String,
}

impl PropertyFields {
    /// All field-level problems, keyed by field name.
    pub fn check(&self) -> FieldErrors {
        let mut errors = match Validate::validate(self) {
            Ok(()) => FieldErrors::new(),
            Err(e) => field_errors(&e),
        };
        if self.property_type.is_none() {
            errors.insert("property_type".into(), "Property type is required".into());
        }
        if let Err(message) = parse_number(&self.price, "Price") {
            errors.insert("price".into(), message);
        }
        if let Err(message) = parse_number(&self.area, "Area") {
            errors.insert("area".into(), message);
        }
        errors
    }

    fn from_property(p: &Property) -> Self {
        Self {
            title: p.title.clone(),
            property_type: Some(p.property_type),
            status: p.status,
            price: format_number(p.price),
            area: format_number(p.area),
            address: p.address.clone(),
            city: p.city.clone(),
            district: p.district.clone(),
            contact_name: p.contact_name.clone(),
            contact_phone: p.contact_phone.clone(),
        }
    }
}

fn parse_number(raw: &str, label: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is required"));
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(format!("{label} must be a number")),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One tile in the image gallery, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Persisted image; `url` is `None` when the server has no stored path.
    Persisted { image_id: u64, url: Option<String> },
    /// Local file attached in this session, not yet uploaded.
    Local { file_name: String },
}

#[derive(Debug, Clone)]
pub struct PropertyForm {
    mode: FormMode,
    pub fields: PropertyFields,
    existing_images: Vec<PropertyImage>,
    new_images: Vec<FileUpload>,
    server_error: Option<String>,
}

impl PropertyForm {
    pub fn create() -> Self {
        Self::with_mode(FormMode::Create)
    }

    pub fn edit(id: PropertyId) -> Self {
        Self::with_mode(FormMode::Edit(id))
    }

    fn with_mode(mode: FormMode) -> Self {
        Self {
            mode,
            fields: PropertyFields::default(),
            existing_images: Vec::new(),
            new_images: Vec::new(),
            server_error: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn existing_images(&self) -> &[PropertyImage] {
        &self.existing_images
    }

    pub fn new_images(&self) -> &[FileUpload] {
        &self.new_images
    }

    /// Error returned by the server on the last submission, shown inline.
    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    /// Request loading the record being edited; `None` in create mode.
    pub fn build_load(&self, client: &ApiClient) -> Option<HttpRequest> {
        match self.mode {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(client.build_get_property(id)),
        }
    }

    /// Parse the load response and populate the form from it.
    pub fn complete_load(
        &mut self,
        client: &ApiClient,
        result: Result<HttpResponse, ApiError>,
    ) -> Result<(), ApiError> {
        let detail = result.and_then(|response| client.parse_get_property(response))?;
        self.apply_loaded(detail);
        Ok(())
    }

    /// Populate scalar fields and the persisted-image list from a record.
    pub fn apply_loaded(&mut self, detail: PropertyDetail) {
        self.fields = PropertyFields::from_property(&detail.property);
        self.existing_images = detail.images;
        debug!(
            id = %detail.property.id,
            images = self.existing_images.len(),
            "property form loaded"
        );
    }

    pub fn attach_files(&mut self, files: impl IntoIterator<Item = FileUpload>) {
        self.new_images.extend(files);
    }

    /// Gallery tiles: persisted images first, then attached local files.
    pub fn previews(&self, assets: &AssetUrls) -> Vec<Preview> {
        self.existing_images
            .iter()
            .map(|img| Preview::Persisted {
                image_id: img.id,
                url: assets.image_url(img),
            })
            .chain(self.new_images.iter().map(|f| Preview::Local {
                file_name: f.file_name.clone(),
            }))
            .collect()
    }

    /// Remove the gallery tile at `index`. Indices inside the persisted list
    /// drop that image from `existing_images[]`; later indices drop the local
    /// file so it is not uploaded. Out-of-range indices are ignored.
    pub fn remove_preview(&mut self, index: usize) {
        let persisted = self.existing_images.len();
        if index < persisted {
            let removed = self.existing_images.remove(index);
            debug!(image_id = removed.id, "persisted image removed from form");
        } else if index - persisted < self.new_images.len() {
            let removed = self.new_images.remove(index - persisted);
            debug!(file = %removed.file_name, "local image removed from form");
        }
    }

    /// Validate and build the submission. Field errors block the request.
    pub fn build_submit(&mut self, client: &ApiClient) -> Result<HttpRequest, FormError> {
        self.server_error = None;
        let errors = self.fields.check();
        if !errors.is_empty() {
            return Err(FormError::Invalid(errors));
        }
        let form = self.to_multipart();
        Ok(match self.mode {
            FormMode::Create => client.build_create_property(form),
            FormMode::Edit(id) => client.build_update_property(id, form),
        })
    }

    fn to_multipart(&self) -> MultipartForm {
        let f = &self.fields;
        let mut form = MultipartForm::new();
        form.text("title", f.title.clone());
        if let Some(property_type) = f.property_type {
            form.text("property_type", property_type.as_str());
        }
        form.text("status", f.status.as_str())
            .text("price", f.price.trim())
            .text("area", f.area.trim())
            .text("address", f.address.clone())
            .text("city", f.city.clone())
            .text("district", f.district.clone())
            .text("contact_name", f.contact_name.clone())
            .text("contact_phone", f.contact_phone.clone());
        for file in &self.new_images {
            form.file("images[]", file.clone());
        }
        for image in &self.existing_images {
            form.text("existing_images[]", image.id.to_string());
        }
        form
    }

    /// Parse the save response. On failure the server's message (or raw
    /// body) is kept for inline display and the error is returned.
    pub fn complete_submit(
        &mut self,
        client: &ApiClient,
        result: Result<HttpResponse, ApiError>,
    ) -> Result<Property, ApiError> {
        match result.and_then(|response| client.parse_save_property(response)) {
            Ok(property) => {
                self.server_error = None;
                self.new_images.clear();
                Ok(property)
            }
            Err(err) => {
                self.server_error = Some(submit_error_message(&err));
                Err(err)
            }
        }
    }
}

fn submit_error_message(err: &ApiError) -> String {
    if let Some(message) = err.server_message() {
        return message.to_string();
    }
    match err {
        ApiError::Http { body, .. } if !body.trim().is_empty() => body.clone(),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestBody;
    use crate::session::Session;

    fn client() -> ApiClient {
        ApiClient::new("http://127.0.0.1:8000/api", Session::with_token("t"))
    }

    fn assets() -> AssetUrls {
        AssetUrls::new("http://127.0.0.1:8000/storage")
    }

    fn filled() -> PropertyFields {
        PropertyFields {
            title: "Garden house".into(),
            property_type: Some(PropertyType::House),
            status: PropertyStatus::Available,
            price: "3500000000".into(),
            area: "120.5".into(),
            address: "5 Le Loi".into(),
            city: "Hue".into(),
            district: "Phu Hoi".into(),
            contact_name: "Minh".into(),
            contact_phone: "0905".into(),
        }
    }

    const DETAIL_JSON: &str = r#"{"id":12,"title":"Sea villa","property_type":"villa",
        "status":"pending","price":"9000000000.00","area":300,"address":"1 Beach Rd",
        "city":"Da Nang","district":"Son Tra","contact_name":"Hoa","contact_phone":"0988",
        "images":[
          {"id":100,"property_id":12,"image_path":"properties/a.jpg","image_name":"a.jpg","is_primary":true,"sort_order":0},
          {"id":101,"property_id":12,"image_path":null,"image_name":"b.jpg","is_primary":false,"sort_order":1}
        ]}"#;

    fn multipart(req: &HttpRequest) -> &MultipartForm {
        match &req.body {
            Some(RequestBody::Multipart(form)) => form,
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn new_form_defaults_status_to_available() {
        let form = PropertyForm::create();
        assert_eq!(form.fields.status, PropertyStatus::Available);
        assert!(form.build_load(&client()).is_none());
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let mut form = PropertyForm::create();
        let err = form.build_submit(&client()).unwrap_err();
        let fields = err.field_errors().unwrap();
        for key in [
            "title",
            "property_type",
            "price",
            "area",
            "address",
            "city",
            "district",
            "contact_name",
            "contact_phone",
        ] {
            assert!(fields.contains_key(key), "missing error for {key}");
        }
        assert!(!fields.contains_key("status"));
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let mut form = PropertyForm::create();
        form.fields = PropertyFields {
            price: "cheap".into(),
            ..filled()
        };
        let err = form.build_submit(&client()).unwrap_err();
        assert_eq!(err.field_errors().unwrap()["price"], "Price must be a number");
        assert_eq!(err.field_errors().unwrap().len(), 1);
    }

    #[test]
    fn create_submission_is_multipart_post() {
        let mut form = PropertyForm::create();
        form.fields = filled();
        form.attach_files([FileUpload::new("front.jpg", "image/jpeg", vec![1, 2])]);
        let req = form.build_submit(&client()).unwrap();
        assert_eq!(req.url(), "http://127.0.0.1:8000/api/properties");
        let body = multipart(&req);
        assert_eq!(body.text_values("title"), vec!["Garden house"]);
        assert_eq!(body.text_values("property_type"), vec!["house"]);
        assert_eq!(body.text_values("status"), vec!["available"]);
        assert_eq!(body.text_values("area"), vec!["120.5"]);
        assert_eq!(body.files("images[]").len(), 1);
        assert!(body.text_values("existing_images[]").is_empty());
    }

    #[test]
    fn edit_load_populates_fields_and_both_image_lists() {
        let c = client();
        let mut form = PropertyForm::edit(PropertyId(12));
        let load = form.build_load(&c).unwrap();
        assert_eq!(load.path, "http://127.0.0.1:8000/api/properties/12");

        form.complete_load(
            &c,
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: DETAIL_JSON.into(),
            }),
        )
        .unwrap();

        assert_eq!(form.fields.title, "Sea villa");
        assert_eq!(form.fields.property_type, Some(PropertyType::Villa));
        assert_eq!(form.fields.status, PropertyStatus::Pending);
        assert_eq!(form.fields.price, "9000000000");
        assert_eq!(form.fields.area, "300");
        assert_eq!(form.fields.city, "Da Nang");
        assert_eq!(form.fields.district, "Son Tra");
        assert_eq!(form.fields.contact_phone, "0988");
        assert_eq!(form.existing_images().len(), 2);
        assert_eq!(
            form.previews(&assets()),
            vec![
                Preview::Persisted {
                    image_id: 100,
                    url: Some("http://127.0.0.1:8000/storage/properties/a.jpg".into())
                },
                Preview::Persisted { image_id: 101, url: None },
            ]
        );
    }

    #[test]
    fn removing_previews_updates_the_right_list() {
        let c = client();
        let mut form = PropertyForm::edit(PropertyId(12));
        form.apply_loaded(serde_json::from_str(DETAIL_JSON).unwrap());
        form.attach_files([
            FileUpload::new("new1.png", "image/png", vec![1]),
            FileUpload::new("new2.png", "image/png", vec![2]),
        ]);
        assert_eq!(form.previews(&assets()).len(), 4);

        form.remove_preview(0); // persisted image 100
        form.remove_preview(1); // first local file (index shifted)
        form.remove_preview(10); // ignored

        assert_eq!(
            form.previews(&assets()),
            vec![
                Preview::Persisted { image_id: 101, url: None },
                Preview::Local { file_name: "new2.png".into() },
            ]
        );

        let req = form.build_submit(&c).unwrap();
        assert_eq!(req.url(), "http://127.0.0.1:8000/api/properties/12?_method=PUT");
        let body = multipart(&req);
        assert_eq!(body.text_values("existing_images[]"), vec!["101"]);
        let files = body.files("images[]");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "new2.png");
    }

    #[test]
    fn failed_submit_keeps_server_message() {
        let c = client();
        let mut form = PropertyForm::create();
        form.fields = filled();
        form.build_submit(&c).unwrap();
        let err = form
            .complete_submit(
                &c,
                Ok(HttpResponse {
                    status: 422,
                    headers: Vec::new(),
                    body: r#"{"message":"The price must be at least 0.","errors":{"price":["The price must be at least 0."]}}"#.into(),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(form.server_error(), Some("The price must be at least 0."));

        form.complete_submit(
            &c,
            Ok(HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: "Server Error".into(),
            }),
        )
        .unwrap_err();
        assert_eq!(form.server_error(), Some("Server Error"));
    }

    #[test]
    fn successful_submit_clears_error_and_local_files() {
        let c = client();
        let mut form = PropertyForm::create();
        form.fields = filled();
        form.attach_files([FileUpload::new("x.png", "image/png", vec![9])]);
        let saved = form
            .complete_submit(
                &c,
                Ok(HttpResponse {
                    status: 201,
                    headers: Vec::new(),
                    body: r#"{"id":1,"title":"Garden house","property_type":"house","status":"available",
                        "price":3500000000,"area":120.5,"address":"5 Le Loi","city":"Hue",
                        "district":"Phu Hoi","contact_name":"Minh","contact_phone":"0905"}"#
                        .into(),
                }),
            )
            .unwrap();
        assert_eq!(saved.id, PropertyId(1));
        assert!(form.server_error().is_none());
        assert!(form.new_images().is_empty());
    }
}
